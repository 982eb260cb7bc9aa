// ── Core error types ──
//
// User-facing errors from kiwi-core. Consumers never see reqwest errors or
// JSON parse failures directly; the `From<kiwi_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use strum::Display;
use thiserror::Error;

use crate::validate::ValidationErrors;

/// Coarse error classification, used by the shell to pick a presentation
/// (inline field errors, a login prompt, a banner) and an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Authentication,
    Server,
    Network,
    Cancelled,
    Config,
    Storage,
    Internal,
}

/// Unified error type for the core crate.
///
/// `Clone` so the managers can keep the last failure around for display
/// while also returning it to the caller.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Validation ───────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not logged in")]
    NotAuthenticated,

    // ── Server ───────────────────────────────────────────────────────
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Unexpected response from server: {message}")]
    MalformedResponse { message: String },

    // ── Network ──────────────────────────────────────────────────────
    #[error("Cannot reach server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Request cancelled")]
    Cancelled,

    // ── Configuration / storage ──────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Credential storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AuthenticationFailed { .. } | Self::NotAuthenticated => {
                ErrorKind::Authentication
            }
            Self::Server { .. } | Self::DeviceNotFound { .. } | Self::MalformedResponse { .. } => {
                ErrorKind::Server
            }
            Self::ConnectionFailed { .. } | Self::Timeout => ErrorKind::Network,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config { .. } => ErrorKind::Config,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The server no longer accepts the held credential.
    pub fn is_auth_loss(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<kiwi_api::Error> for CoreError {
    fn from(err: kiwi_api::Error) -> Self {
        match err {
            kiwi_api::Error::Unauthorized { message } => CoreError::AuthenticationFailed { message },
            kiwi_api::Error::Server { status, message } => CoreError::Server { status, message },
            kiwi_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if let Some(status) = e.status() {
                    CoreError::Server {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.origin().ascii_serialization())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            kiwi_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            kiwi_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            kiwi_api::Error::Cancelled => CoreError::Cancelled,
            kiwi_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_auth_loss() {
        let err = CoreError::from(kiwi_api::Error::Unauthorized {
            message: "Could not validate credentials".into(),
        });
        assert!(err.is_auth_loss());
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn server_error_keeps_message() {
        let err = CoreError::from(kiwi_api::Error::Server {
            status: 409,
            message: "MAC already registered".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.to_string(), "MAC already registered");
    }

    #[test]
    fn validation_kind() {
        let err = CoreError::validation("mac", "invalid");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.is_auth_loss());
    }

    #[test]
    fn cancelled_is_its_own_kind() {
        assert_eq!(
            CoreError::from(kiwi_api::Error::Cancelled).kind(),
            ErrorKind::Cancelled
        );
    }
}
