//! Error taxonomy for pluggable providers (spec §7).

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    /// Retried with backoff by the caller (429/5xx).
    #[error("transient provider error (status {status:?}): {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },
    /// Surfaced as a failed operation; the calling layer degrades.
    #[error("permanent provider error (status {status:?}): {message}")]
    Permanent {
        status: Option<u16>,
        message: String,
    },
    #[error("failed to parse provider response: {0}")]
    Unparseable(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient { .. })
    }

    /// Classify an HTTP status into transient vs. permanent per §7:
    /// 429 and 5xx retry with backoff; other 4xx and non-HTTP errors
    /// propagate.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 || (500..600).contains(&status) {
            ProviderError::Transient {
                status: Some(status),
                message,
            }
        } else {
            ProviderError::Permanent {
                status: Some(status),
                message,
            }
        }
    }
}
