//! Error types for the Keyway API client.

use tracing::error;

/// All errors a client call can surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid client configuration.
    #[error("keyway client config error: {0}")]
    Config(String),

    /// The caller passed arguments that cannot form a request.
    #[error("{0}")]
    InvalidInput(String),

    /// The backend could not be reached. The underlying cause stays in the
    /// error source; the message is safe to show as-is.
    #[error("Unable to reach Keyway. Check your connection and try again.")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status. `message` is shown to the
    /// user verbatim.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The response does not match the expected wire shape. This is a
    /// contract defect between console and backend, never coerced.
    #[error("unexpected response for {context}: {reason}")]
    Translation {
        /// The wire shape being decoded.
        context: &'static str,
        /// What did not match.
        reason: String,
    },

    /// A request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// Build a translation error, logging it loudly.
    pub(crate) fn translation(context: &'static str, reason: impl std::fmt::Display) -> Self {
        let reason = reason.to_string();
        error!(context, reason = %reason, "backend response does not match the expected shape");
        Self::Translation { context, reason }
    }

    /// HTTP status of a backend rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether offering the user a retry makes sense.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            Self::Config(_)
            | Self::InvalidInput(_)
            | Self::Translation { .. }
            | Self::Encode(_) => false,
        }
    }

    /// Whether the caller must sign in again.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
