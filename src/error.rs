// src/error.rs
//! Error taxonomy shared by fetchers, the store and notifiers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Transport failure, timeout or non-2xx status. Retried.
    #[error("network error: {0}")]
    Network(String),

    /// Well-formed failure answer from the provider. Never retried.
    #[error("provider error: {0}")]
    Application(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Missing or incomplete settings; the affected feature is disabled.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Raw record could not be turned into an announcement.
    #[error("normalize error: {0}")]
    Normalize(String),
}

impl MonitorError {
    /// Default retry predicate: only transport-class failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MonitorError::Network(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::Network(_) => "network",
            MonitorError::Application(_) => "application",
            MonitorError::Storage(_) => "storage",
            MonitorError::Configuration(_) => "configuration",
            MonitorError::Normalize(_) => "normalize",
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(e: reqwest::Error) -> Self {
        // Body decode failures mean the provider answered with something we can't use.
        if e.is_decode() {
            MonitorError::Application(format!("undecodable response: {e}"))
        } else {
            MonitorError::Network(e.to_string())
        }
    }
}
