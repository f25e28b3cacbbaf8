use thiserror::Error;

/// Errors raised while wiring collectors to a subscription source.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid topic filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: &'static str },

    #[error("Subscription to '{filter}' rejected: {reason}")]
    Subscribe { filter: String, reason: String },
}

impl Error {
    /// Create a subscription rejection error.
    pub fn subscribe(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Subscribe {
            filter: filter.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using the collector subsystem's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
