//! Error taxonomy for provider calls, the decision oracle, and the API.
//!
//! Providers fail in four distinct ways and callers react differently to
//! each: auth/plan rejections trigger a fallback endpoint, transient
//! statuses are retried with backoff, transport and decode failures are
//! terminal for the single call. Missing data is not an error at all; it
//! degrades to null fields on the snapshot.

use thiserror::Error;

/// Failure of a single call to an upstream data provider.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 401/403: bad key or insufficient plan. Never retried; overview
    /// callers fall back to the coarser price endpoint.
    #[error("{provider} rejected credentials or plan (status {status})")]
    AuthOrPlan { provider: &'static str, status: u16 },

    /// Rate-limit or server-side failure; retriable with backoff.
    #[error("{provider} transient failure (status {status})")]
    Transient { provider: &'static str, status: u16 },

    /// Any other non-success status.
    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },

    /// Transport-level failure (timeout, connect, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body arrived but did not decode into the expected shape.
    #[error("{provider} returned an unusable payload: {detail}")]
    BadPayload {
        provider: &'static str,
        detail: String,
    },
}

impl SourceError {
    /// Only transient statuses qualify for the retry loop.
    pub fn is_retriable(&self) -> bool {
        matches!(self, SourceError::Transient { .. })
    }

    pub fn is_auth_or_plan(&self) -> bool {
        matches!(self, SourceError::AuthOrPlan { .. })
    }
}

/// Failure of one decision-oracle batch.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request body could not be serialized.
    #[error("oracle request could not be built: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The completion endpoint answered but carried no content.
    #[error("oracle returned an empty completion")]
    EmptyCompletion,

    /// Raw output could not be coerced into the verdict structure.
    #[error("oracle output did not parse as verdicts: {0}")]
    MalformedOutput(String),
}

/// Client-visible request failures for the signals API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required identifying input was absent; surfaced as 400.
    #[error("{0}")]
    MissingParam(String),

    /// Nothing survived the local filter stage; surfaced as 404.
    #[error("{0}")]
    NoMatches(String),
}
