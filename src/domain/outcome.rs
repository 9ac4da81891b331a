use super::error::OutputError;

/// Result of handing one request descriptor to the dispatcher.
///
/// Classification order is fixed: 2xx first, then the recoverable status
/// set, then everything else.
#[derive(Debug)]
pub enum Outcome {
    /// 2xx response.
    Success,
    /// Dropped by the rate limiter; no network call was made.
    Skipped,
    /// Status code in the configured recoverable set. Carries
    /// `"<code> <reason> <body>"`.
    RecoverableFailure(String),
    /// Transport-level failure (connect, TLS, timeout, body read).
    FatalFailure(OutputError),
    /// Any other non-2xx status, or no response at all.
    Rejected(String),
}

/// Fieldless mirror of [`Outcome`] used for metrics and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    Skipped,
    RecoverableFailure,
    FatalFailure,
    Rejected,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success => OutcomeKind::Success,
            Self::Skipped => OutcomeKind::Skipped,
            Self::RecoverableFailure(_) => OutcomeKind::RecoverableFailure,
            Self::FatalFailure(_) => OutcomeKind::FatalFailure,
            Self::Rejected(_) => OutcomeKind::Rejected,
        }
    }

    /// Whether a network request was actually issued.
    pub fn attempted(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}
