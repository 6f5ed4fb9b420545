//! Process configuration, read once at startup and passed into every
//! collaborator. No ambient globals: collaborators only see this value.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("configuration error: {0}")]
    Validation(String),
}

/// Service configuration with all tunables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Solscan API base URL
    pub solscan_base_url: String,
    /// Solscan API key (requests go out unauthenticated without one)
    pub solscan_api_key: Option<String>,
    /// Serve a fixed mock meta payload instead of calling Solscan
    pub solscan_dry_run: bool,
    /// Solscan request timeout in seconds
    pub solscan_timeout_seconds: u64,

    /// Birdeye API base URL
    pub birdeye_base_url: String,
    /// Birdeye API key
    pub birdeye_api_key: String,
    /// Serve empty enrichment payloads instead of calling Birdeye
    pub birdeye_dry_run: bool,
    /// Chain identifier passed to market-data endpoints
    pub chain: String,
    /// Market-data request timeout in seconds
    pub http_timeout_seconds: u64,
    /// Attempt ceiling for retriable market-data failures
    pub http_max_retries: usize,

    /// Discovery feed base URL
    pub dexscreener_base_url: String,

    /// Decision-oracle API key; the oracle is disabled without one
    pub oracle_api_key: Option<String>,
    /// Chat-completions endpoint
    pub oracle_endpoint: String,
    /// Model name sent to the oracle
    pub oracle_model: String,
    /// Sampling temperature
    pub oracle_temperature: f64,
    /// Tokens per oracle request
    pub oracle_batch_size: usize,

    /// Snapshot cache TTL in seconds
    pub cache_ttl_seconds: u64,
    /// Maximum snapshot cache entries
    pub max_cache_entries: u64,
    /// Maximum token pipelines in flight per request
    pub max_parallel_tokens: usize,
    /// Market-data rate limit, requests per second
    pub rate_limit_requests_per_second: u32,

    /// Bind address for the signals API
    pub listen_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            solscan_base_url: "https://pro-api.solscan.io".to_string(),
            solscan_api_key: None,
            solscan_dry_run: true,
            solscan_timeout_seconds: 15,
            birdeye_base_url: "https://public-api.birdeye.so".to_string(),
            birdeye_api_key: String::new(),
            birdeye_dry_run: false,
            chain: "solana".to_string(),
            http_timeout_seconds: 10,
            http_max_retries: 5,
            dexscreener_base_url: "https://api.dexscreener.com".to_string(),
            oracle_api_key: None,
            oracle_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            oracle_model: "gpt-4o-mini".to_string(),
            oracle_temperature: 0.2,
            oracle_batch_size: 8,
            cache_ttl_seconds: 300,
            max_cache_entries: 1000,
            max_parallel_tokens: 8,
            rate_limit_requests_per_second: 10,
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from environment variables, falling back to
    /// the defaults above for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            solscan_base_url: trimmed_env("SOLSCAN_BASE", &defaults.solscan_base_url),
            solscan_api_key: optional_env("SOLSCAN_API_KEY"),
            solscan_dry_run: bool_env("SOLSCAN_DRY_RUN", defaults.solscan_dry_run),
            solscan_timeout_seconds: parsed_env(
                "SOLSCAN_TIMEOUT",
                defaults.solscan_timeout_seconds,
            )?,
            birdeye_base_url: trimmed_env("BIRDEYE_BASE_URL", &defaults.birdeye_base_url),
            birdeye_api_key: optional_env("BIRDEYE_API_KEY").unwrap_or_default(),
            birdeye_dry_run: bool_env("BIRDEYE_DRY_RUN", defaults.birdeye_dry_run),
            chain: trimmed_env("CHAIN", &defaults.chain),
            http_timeout_seconds: parsed_env("HTTP_TIMEOUT", defaults.http_timeout_seconds)?,
            http_max_retries: parsed_env("HTTP_MAX_RETRIES", defaults.http_max_retries)?,
            dexscreener_base_url: trimmed_env(
                "DEXSCREENER_BASE_URL",
                &defaults.dexscreener_base_url,
            ),
            oracle_api_key: optional_env("OPENAI_API_KEY"),
            oracle_endpoint: trimmed_env("OPENAI_ENDPOINT", &defaults.oracle_endpoint),
            oracle_model: trimmed_env("OPENAI_MODEL", &defaults.oracle_model),
            oracle_temperature: defaults.oracle_temperature,
            oracle_batch_size: defaults.oracle_batch_size,
            cache_ttl_seconds: parsed_env("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds)?,
            max_cache_entries: defaults.max_cache_entries,
            max_parallel_tokens: parsed_env("MAX_PARALLEL_TOKENS", defaults.max_parallel_tokens)?,
            rate_limit_requests_per_second: parsed_env(
                "RATE_LIMIT_RPS",
                defaults.rate_limit_requests_per_second,
            )?,
            listen_addr: trimmed_env("LISTEN_ADDR", &defaults.listen_addr),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.birdeye_api_key.is_empty() && !self.birdeye_dry_run {
            return Err(ConfigError::Validation(
                "BIRDEYE_API_KEY is required unless BIRDEYE_DRY_RUN=true".to_string(),
            ));
        }
        if self.http_max_retries == 0 {
            return Err(ConfigError::Validation(
                "HTTP_MAX_RETRIES must be at least 1".to_string(),
            ));
        }
        if self.rate_limit_requests_per_second == 0 {
            return Err(ConfigError::Validation(
                "RATE_LIMIT_RPS must be positive".to_string(),
            ));
        }
        if self.max_parallel_tokens == 0 {
            return Err(ConfigError::Validation(
                "MAX_PARALLEL_TOKENS must be positive".to_string(),
            ));
        }
        if self.oracle_batch_size == 0 {
            return Err(ConfigError::Validation(
                "oracle batch size must be positive".to_string(),
            ));
        }
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "LISTEN_ADDR",
                value: self.listen_addr.clone(),
            })?;
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn solscan_timeout(&self) -> Duration {
        Duration::from_secs(self.solscan_timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// The oracle only runs with credentials configured.
    pub fn oracle_enabled(&self) -> bool {
        self.oracle_api_key
            .as_deref()
            .map(|k| !k.is_empty())
            .unwrap_or(false)
    }
}

fn trimmed_env(key: &'static str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().trim_end_matches('/').to_string(),
        _ => default.trim_end_matches('/').to_string(),
    }
}

fn optional_env(key: &'static str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bool_env(key: &'static str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => v.trim().eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

fn parsed_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: v.clone(),
        }),
        Err(_) => Ok(default),
    }
}
