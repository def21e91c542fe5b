use thiserror::Error;

/// Internal-only error for one HTTP attempt against a vendor.
///
/// Never crosses a `Provider` trait method boundary — `generate` and
/// `probe` fold this into `ModelOutput`/`ProviderHealth` instead.
#[derive(Debug, Error)]
pub(crate) enum AttemptError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("vendor returned {status}: {body}")]
    VendorStatus { status: u16, body: String },
    #[error("failed to parse vendor response: {0}")]
    Parse(String),
    #[error("missing credential `{0}`")]
    MissingCredential(String),
}

impl AttemptError {
    /// Whether this attempt is worth retrying per the adapter retry policy
    /// (transport errors and vendor 5xx/429 only).
    pub(crate) const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::VendorStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Parse(_) | Self::MissingCredential(_) => false,
        }
    }
}
