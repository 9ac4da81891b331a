use thiserror::Error;

/// Errors the HTTP output surfaces to its caller.
///
/// Rate-limited attempts and unclassified non-2xx responses are not errors;
/// they only show up as [`Outcome`](super::Outcome) variants.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{method} {url} raised {kind} error: {source}")]
    Transport {
        method: &'static str,
        url: String,
        kind: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Recoverable response: {0}")]
    Recoverable(String),
}

impl OutputError {
    /// True when the host pipeline should re-deliver the payload.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
