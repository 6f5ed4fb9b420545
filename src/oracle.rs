//! External decision oracle.
//!
//! Sends fixed-size batches of compacted token records to an OpenAI-style
//! chat-completions endpoint and parses the reply into [`Verdict`]s. The
//! oracle is display-only: its output never feeds back into local scoring,
//! and a batch whose reply cannot be parsed degrades to a fixed conservative
//! verdict per token instead of failing the request.

use crate::config::AppConfig;
use crate::error::OracleError;
use crate::types::{Decision, Link, Snapshot, TokenProfile, Verdict};
use nonempty::NonEmpty;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Truncation applied to the projected description before it is sent out.
const DESCRIPTION_MAX_CHARS: usize = 800;
/// Truncation applied to the rationale coming back.
const RATIONALE_MAX_CHARS: usize = 500;
const FALLBACK_CONFIDENCE: f64 = 35.0;

const SYSTEM_PROMPT: &str = r#"You are a senior quantitative analyst focused on memecoins.
Task: classify each token as exactly ONE of: "enter", "watch", "avoid".
Constraints:
- Be conservative when essential data is missing (official links, liquidity/volume, history).
- Penalize tokens with no official website/telegram/twitter.
- Treat vague or grandiose descriptions as honeypot risk.
- Do NOT invent data that was not provided.

Answer in strict JSON: a list of objects shaped
{
  "tokenAddress": "string",
  "decision": "enter" | "watch" | "avoid",
  "confidence": 0-100,
  "rationale": "short, objective explanation (<= 500 chars)"
}
"#;

fn user_prompt(compact_json: &str) -> String {
    format!(
        "Analyze the tokens below. Practical criteria:\n\
         - Reasonable liquidity for execution (when given). Missing liquidity => \"avoid\" or \"watch\".\n\
         - Volume/activity (when given) => trend and exit capacity.\n\
         - Official links (website, twitter, telegram) => seriousness signal.\n\
         - Description content: avoid empty hype or grand promises.\n\
         \n\
         Tokens:\n{compact_json}\n\
         \n\
         Answer ONLY with the requested JSON, no extra text, no markdown, no ```json."
    )
}

/// Size- and privacy-reduced projection of one token, the only thing the
/// oracle ever sees.
#[derive(Debug, Clone, Serialize)]
pub struct CompactToken {
    #[serde(rename = "tokenAddress")]
    pub token_address: String,
    pub url: Option<String>,
    pub header: Option<String>,
    pub description: String,
    #[serde(rename = "chainId")]
    pub chain_id: String,
    pub links: Vec<Link>,
}

impl CompactToken {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let links = snapshot
            .links
            .iter()
            .filter(|l| !l.url.is_empty())
            .map(|l| Link::new(&l.kind.to_lowercase(), l.url.clone()))
            .collect();
        Self {
            token_address: snapshot.token_address.clone(),
            url: snapshot.solscan_url.clone().or_else(|| snapshot.url.clone()),
            header: Some(snapshot.header.clone()).filter(|h| !h.is_empty()),
            description: truncate_chars(snapshot.description.trim(), DESCRIPTION_MAX_CHARS),
            chain_id: snapshot.chain_id.to_lowercase(),
            links,
        }
    }

    /// Projection of a discovery-feed profile. Callers must have ensured the
    /// profile carries an address.
    pub fn from_profile(profile: &TokenProfile) -> Self {
        let links = profile
            .links
            .iter()
            .filter_map(|l| {
                let url = l.url.as_deref().filter(|u| !u.is_empty())?;
                Some(Link::new(&l.kind_or_label().unwrap_or_default(), url))
            })
            .collect();
        let chain_id = match &profile.chain_id {
            Some(Value::String(s)) => s.to_lowercase(),
            Some(other) => other.to_string().to_lowercase(),
            None => String::new(),
        };
        Self {
            token_address: profile.token_address.clone().unwrap_or_default(),
            url: profile.url.clone(),
            header: profile.header.clone(),
            description: truncate_chars(
                profile.description.as_deref().unwrap_or("").trim(),
                DESCRIPTION_MAX_CHARS,
            ),
            chain_id,
            links,
        }
    }
}

/// Chat-completions client for the decision oracle.
#[derive(Debug, Clone)]
pub struct LlmOracle {
    http_client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    batch_size: usize,
}

impl LlmOracle {
    /// Builds the oracle when credentials are configured; `None` disables
    /// the analyze path entirely.
    pub fn from_config(http_client: Client, config: &AppConfig) -> Option<Self> {
        let api_key = config.oracle_api_key.clone().filter(|k| !k.is_empty())?;
        Some(Self {
            http_client,
            endpoint: config.oracle_endpoint.clone(),
            api_key,
            model: config.oracle_model.clone(),
            temperature: config.oracle_temperature,
            batch_size: config.oracle_batch_size,
        })
    }

    /// Decides all tokens in fixed-size batches. A failed batch yields the
    /// fixed fallback verdict per token; sibling batches are unaffected.
    #[instrument(skip(self, tokens), fields(tokens = tokens.len()))]
    pub async fn decide(&self, tokens: &NonEmpty<CompactToken>) -> Vec<Verdict> {
        let all: Vec<&CompactToken> = tokens.iter().collect();
        let mut verdicts = Vec::with_capacity(all.len());

        for batch in all.chunks(self.batch_size) {
            match self.decide_batch(batch).await {
                Ok(mut batch_verdicts) => {
                    debug!("oracle answered {} verdicts", batch_verdicts.len());
                    verdicts.append(&mut batch_verdicts);
                }
                Err(e) => {
                    warn!("oracle batch failed, substituting fallback verdicts: {}", e);
                    verdicts.extend(batch.iter().map(|t| fallback_verdict(&t.token_address)));
                }
            }
        }
        verdicts
    }

    async fn decide_batch(&self, batch: &[&CompactToken]) -> Result<Vec<Verdict>, OracleError> {
        let compact_json = serde_json::to_string(batch)?;
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(&compact_json)},
            ],
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let completion: ChatCompletion = response.json().await?;
        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("")
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(OracleError::EmptyCompletion);
        }
        parse_verdicts(&text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Verdict as the model emits it: loosely typed, possibly incomplete.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVerdict {
    #[serde(rename = "tokenAddress")]
    token_address: Option<String>,
    decision: Option<String>,
    confidence: Option<f64>,
    rationale: Option<String>,
}

/// Parses the model reply into verdicts. The reply should be bare JSON, but
/// models wrap it anyway: code fences are stripped, then a direct parse is
/// tried, then the first complete array slice, then the first complete
/// object slice (one object reads as a singleton list).
pub fn parse_verdicts(raw: &str) -> Result<Vec<Verdict>, OracleError> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(OracleError::EmptyCompletion);
    }

    if let Some(parsed) = try_parse(text) {
        return Ok(finish(parsed));
    }
    if let Some(slice) = slice_between(text, '[', ']') {
        if let Some(parsed) = try_parse(slice) {
            return Ok(finish(parsed));
        }
    }
    if let Some(slice) = slice_between(text, '{', '}') {
        if let Some(parsed) = try_parse(slice) {
            return Ok(finish(parsed));
        }
    }
    Err(OracleError::MalformedOutput(preview(raw)))
}

fn try_parse(text: &str) -> Option<Vec<RawVerdict>> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value {
        Value::Array(_) => serde_json::from_value(value).ok(),
        Value::Object(_) => serde_json::from_value::<RawVerdict>(value)
            .ok()
            .map(|v| vec![v]),
        _ => None,
    }
}

/// Drops address-less entries, normalizes labels, clamps confidence and
/// truncates the rationale.
fn finish(raw: Vec<RawVerdict>) -> Vec<Verdict> {
    raw.into_iter()
        .filter_map(|r| {
            let token_address = r.token_address.filter(|a| !a.is_empty())?;
            Some(Verdict {
                token_address,
                decision: r.decision.as_deref().and_then(Decision::parse_label),
                confidence: r.confidence.map(|c| c.clamp(0.0, 100.0)),
                rationale: r
                    .rationale
                    .map(|text| truncate_chars(&text, RATIONALE_MAX_CHARS)),
            })
        })
        .collect()
}

fn fallback_verdict(address: &str) -> Verdict {
    Verdict {
        token_address: address.to_string(),
        decision: Some(Decision::Watch),
        confidence: Some(FALLBACK_CONFIDENCE),
        rationale: Some("Could not parse the oracle output; use the local evaluation.".to_string()),
    }
}

fn strip_code_fences(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// First occurrence of `open` through the last occurrence of `close`.
fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn preview(raw: &str) -> String {
    truncate_chars(raw, 300)
}
