// ── Runtime connection configuration ──
//
// These types describe *how* to reach the registry backend. They never
// touch disk: the CLI builds a `DashboardConfig` (usually from a
// kiwi-config profile) and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use kiwi_api::{TlsMode, TransportConfig};
use url::Url;

/// Backend used when no profile or flag names one.
pub const DEFAULT_API_URL: &str = "https://svr.kiwiwip.duckdns.org";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Opt-in only.
    DangerAcceptInvalid,
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Backend base URL (e.g., `https://svr.kiwiwip.duckdns.org`).
    pub api_url: Url,
    pub tls: TlsVerification,
    /// Request timeout. `Duration::ZERO` disables it.
    pub timeout: Duration,
}

impl DashboardConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            ..TransportConfig::default()
        }
        .with_timeout(self.timeout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_disables_it() {
        let mut config = DashboardConfig::new(Url::parse(DEFAULT_API_URL).unwrap());
        config.timeout = Duration::ZERO;
        assert!(config.transport().timeout.is_none());
    }

    #[test]
    fn insecure_maps_to_accept_invalid() {
        let mut config = DashboardConfig::new(Url::parse(DEFAULT_API_URL).unwrap());
        config.tls = TlsVerification::DangerAcceptInvalid;
        assert!(matches!(config.transport().tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(config.transport().timeout, Some(DEFAULT_TIMEOUT));
    }
}
