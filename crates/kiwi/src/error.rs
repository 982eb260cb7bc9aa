//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use kiwi_config::ConfigError;
use kiwi_core::{CoreError, ValidationErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(kiwi::connection_failed),
        help(
            "Check that the backend is reachable.\n\
             URL: {url}\n\
             For a self-signed certificate, try --insecure (-k) or set ca_cert."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(kiwi::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    #[error("Operation cancelled")]
    #[diagnostic(code(kiwi::cancelled))]
    Cancelled,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(kiwi::auth_failed),
        help("Log in again with: kiwi login")
    )]
    AuthFailed { message: String },

    #[error("Not logged in (profile '{profile}')")]
    #[diagnostic(
        code(kiwi::not_logged_in),
        help("Run: kiwi login --profile {profile}")
    )]
    NotLoggedIn { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(kiwi::not_found),
        help("Run: kiwi {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(kiwi::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kiwi::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid input")]
    #[diagnostic(code(kiwi::invalid_input), help("{details}"))]
    InvalidInput { details: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(kiwi::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: kiwi config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(kiwi::config),
        help("Check the config file shown by: kiwi config path")
    )]
    Config { message: String },

    #[error("Credential storage failed: {message}")]
    #[diagnostic(
        code(kiwi::storage),
        help("Set token_storage = \"file\" under [defaults] if no keyring is available.")
    )]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(kiwi::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotLoggedIn { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidInput { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => errors.into(),

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::NotAuthenticated => CliError::NotLoggedIn {
                profile: "current".into(),
            },

            CoreError::Server { status, message } => CliError::ApiError {
                code: status.to_string(),
                message,
            },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::MalformedResponse { message } => CliError::ApiError {
                code: "malformed_response".into(),
                message,
            },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Cancelled => CliError::Cancelled,

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Storage { message } => CliError::Storage { message },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<ValidationErrors> for CliError {
    fn from(errors: ValidationErrors) -> Self {
        if errors.len() == 1 {
            if let Some((field, reason)) = errors.iter().next() {
                return CliError::Validation {
                    field: field.into(),
                    reason: reason.into(),
                };
            }
        }
        let details = errors
            .iter()
            .map(|(field, reason)| format!("{field}: {reason}"))
            .collect::<Vec<_>>()
            .join("\n");
        CliError::InvalidInput { details }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => {
                let available = kiwi_config::load_config_or_default()
                    .profiles
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>();
                CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                }
            }
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::from(CoreError::NotAuthenticated).exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(CoreError::DeviceNotFound {
                identifier: "7".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(CoreError::ConnectionFailed {
                url: "https://x".into(),
                reason: "refused".into()
            })
            .exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::from(CoreError::Server {
                status: 500,
                message: "boom".into()
            })
            .exit_code(),
            exit_code::GENERAL
        );
    }

    #[test]
    fn single_validation_error_names_its_field() {
        let err = CliError::from(ValidationErrors::single("mac", "invalid MAC address"));
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "mac"));
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn several_validation_errors_are_listed() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "name is required");
        errors.add("tx_power", "out of range");
        let CliError::InvalidInput { details } = CliError::from(CoreError::Validation(errors))
        else {
            panic!("expected InvalidInput");
        };
        assert_eq!(details, "name: name is required\ntx_power: out of range");
    }
}
