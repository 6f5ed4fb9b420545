//! Discovery feed client.
//!
//! Pulls the latest token-profile list. The feed is best-effort input to the
//! profile filter, so every failure degrades to an empty list.

use crate::config::AppConfig;
use crate::error::SourceError;
use crate::types::TokenProfile;
use reqwest::Client;
use tracing::{debug, instrument, warn};

const PROVIDER: &str = "dexscreener";
const PROFILES_PATH: &str = "/token-profiles/latest/v1";

/// Client for the token-discovery feed.
#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    http_client: Client,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(http_client: Client, config: &AppConfig) -> Self {
        Self {
            http_client,
            base_url: config.dexscreener_base_url.clone(),
        }
    }

    /// The latest discovered token profiles; empty on any failure.
    #[instrument(skip(self))]
    pub async fn latest_profiles(&self) -> Vec<TokenProfile> {
        match self.fetch_profiles().await {
            Ok(profiles) => {
                debug!("discovery feed returned {} profiles", profiles.len());
                profiles
            }
            Err(e) => {
                warn!("discovery feed failed, continuing with no profiles: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_profiles(&self) -> Result<Vec<TokenProfile>, SourceError> {
        let url = format!("{}{}", self.base_url, PROFILES_PATH);
        let response = self
            .http_client
            .get(&url)
            .header("Accept", "*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        response
            .json::<Vec<TokenProfile>>()
            .await
            .map_err(|e| SourceError::BadPayload {
                provider: PROVIDER,
                detail: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::types::TokenProfile;
    use serde_json::json;

    #[test]
    fn feed_entries_deserialize_with_partial_fields() {
        let raw = json!([
            {
                "tokenAddress": "So11111111111111111111111111111111111111112",
                "url": "https://dexscreener.com/solana/xyz",
                "chainId": "solana",
                "links": [{"type": "twitter", "url": "https://x.com/xyz"}]
            },
            {"description": "no address at all"}
        ]);
        let profiles: Vec<TokenProfile> =
            serde_json::from_value(raw).expect("feed entries tolerate missing fields");
        assert_eq!(profiles.len(), 2);
        assert_eq!(
            profiles[0].token_address.as_deref(),
            Some("So11111111111111111111111111111111111111112")
        );
        assert!(profiles[1].token_address.is_none());
        assert!(profiles[1].links.is_empty());
    }
}
