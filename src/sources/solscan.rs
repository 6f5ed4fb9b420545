//! Solscan metadata client.
//!
//! Tries the current API first and falls back to the legacy route when that
//! answers with anything but 200. Missing data is never fatal here: every
//! failure degrades to the empty payload and the normalizer takes it from
//! there.

use crate::config::AppConfig;
use crate::error::SourceError;
use crate::pipeline::MetaPayload;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

const PROVIDER: &str = "solscan";

/// Client for the token-metadata provider.
#[derive(Debug, Clone)]
pub struct SolscanClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    dry_run: bool,
}

impl SolscanClient {
    pub fn new(http_client: Client, config: &AppConfig) -> Self {
        Self {
            http_client,
            base_url: config.solscan_base_url.clone(),
            api_key: config.solscan_api_key.clone(),
            dry_run: config.solscan_dry_run,
        }
    }

    /// Fetches token metadata, degrading to the empty payload on any
    /// failure so the pipeline continues with null fields.
    #[instrument(skip(self), fields(mint = %address))]
    pub async fn token_meta(&self, address: &str) -> MetaPayload {
        if self.dry_run {
            debug!("dry run, serving mock metadata");
            return mock_meta();
        }

        match self.fetch_meta(address).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("metadata fetch failed, proceeding without it: {}", e);
                MetaPayload::default()
            }
        }
    }

    async fn fetch_meta(&self, address: &str) -> Result<MetaPayload, SourceError> {
        let current = format!("{}/v2.0/token/meta", self.base_url);
        match self.get_payload(&current, &[("address", address)]).await {
            Ok(meta) => Ok(meta),
            Err(e) => {
                debug!("current metadata route failed ({}), trying legacy", e);
                let legacy = format!("{}/v1.0/token/meta", self.base_url);
                self.get_payload(&legacy, &[("tokenAddress", address)])
                    .await
            }
        }
    }

    async fn get_payload(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<MetaPayload, SourceError> {
        let mut request = self.http_client.get(url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header("token", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        Ok(payload_from(unwrap_envelope(body)))
    }
}

/// Responses may arrive wrapped in `{"success": …, "data": {…}}`. Unwraps
/// only when the data member is itself an object.
fn unwrap_envelope(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        if map.get("data").map(Value::is_object).unwrap_or(false) {
            if let Some(data) = map.remove("data") {
                return data;
            }
        }
    }
    value
}

/// Unexpected shapes degrade to the empty payload, field by field.
fn payload_from(value: Value) -> MetaPayload {
    serde_json::from_value(value).unwrap_or_default()
}

fn mock_meta() -> MetaPayload {
    MetaPayload {
        symbol: Some("MOCK".to_string()),
        holder: Some(321),
        website: Some("https://example.org".to_string()),
        created_time: Some(1_723_500_000),
        ..MetaPayload::default()
    }
}
