//! Client-side error taxonomy.
//!
//! The reconciler needs to distinguish "the service could not be reached"
//! (triggers the local fallback) from "the service answered with an error"
//! (surfaced to the caller), so the two are separate variants.

use thiserror::Error;

/// Errors surfaced by the API client and the reconciler.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response: connect failure, timeout,
    /// aborted transfer. Cart operations fall back to local state on this.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("api error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
    },

    /// Client-side validation rejected the input before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation requires a signed-in user.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Whether the error means the service was unreachable (as opposed to
    /// reachable-but-unhappy). Server-side 5xx counts: the tier is up but
    /// broken, and the storefront should degrade the same way.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_classification() {
        assert!(ClientError::Transport("timeout".to_owned()).is_unreachable());
        assert!(
            ClientError::Api {
                status: 503,
                message: String::new()
            }
            .is_unreachable()
        );
        assert!(
            !ClientError::Api {
                status: 400,
                message: String::new()
            }
            .is_unreachable()
        );
        assert!(!ClientError::NotAuthenticated.is_unreachable());
    }
}
