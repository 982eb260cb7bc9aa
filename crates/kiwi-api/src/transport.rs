// Shared transport configuration for building reqwest::Client instances.
//
// TLS, timeout and user-agent settings live here so the API client and
// any future surface build identical HTTP stacks.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed staging servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("kiwi/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Set the request timeout; zero disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_disables_limit() {
        let config = TransportConfig::default().with_timeout(Duration::ZERO);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn missing_ca_file_is_tls_error() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/kiwi-ca.pem")),
            timeout: None,
        };
        assert!(matches!(config.build_client(), Err(Error::Tls(_))));
    }
}
