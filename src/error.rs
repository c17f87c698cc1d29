//! Error types for OpenResearch.
//!
//! Messages are short and human-readable because most of them end up in the
//! error banner verbatim. No API keys appear in any message.

use crate::credentials::CredentialKey;

/// Maximum number of bytes of a provider error body kept in a [`ClientError`].
const MAX_BODY_PREVIEW: usize = 200;

/// Errors from a single provider call (search or synthesis).
///
/// `Clone` so outcomes can travel inside UI messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The run's cancellation token fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The request exceeded its configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Transport failure: DNS, connection refused, TLS, and so on.
    #[error("request error: {0}")]
    Http(String),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be parsed, or lacked the expected content.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// Cancellation is not a failure; the orchestrator discards it silently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Build a [`ClientError::Status`] with a bounded body preview.
    pub fn status(status: reqwest::StatusCode, body: &str) -> Self {
        let mut preview = body.trim().to_owned();
        if preview.len() > MAX_BODY_PREVIEW {
            let mut cut = MAX_BODY_PREVIEW;
            while !preview.is_char_boundary(cut) {
                cut -= 1;
            }
            preview.truncate(cut);
            preview.push('…');
        }
        Self::Status {
            status: status.as_u16(),
            body: preview,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Errors that terminate a run in the `Failed` phase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// A required credential is absent; detected before any network call.
    #[error("Missing {0}. Open settings to add it.")]
    MissingCredential(CredentialKey),

    #[error("search failed: {0}")]
    SearchFailed(ClientError),

    #[error("synthesis failed: {0}")]
    SynthesisFailed(ClientError),
}

/// Errors from persisting the credential record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize credentials: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No writable storage location could be determined.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors from loading or validating `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
