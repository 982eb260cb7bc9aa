use thiserror::Error;

/// Top-level error type for the `kiwi-api` crate.
///
/// The transport only classifies failures. Reacting to them (dropping a
/// session, tearing down caches) is the caller's job; `kiwi-core` maps
/// these into its own user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// HTTP 401: the bearer credential is missing, expired, or was revoked,
    /// or the token exchange rejected the supplied credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── Server ──────────────────────────────────────────────────────
    /// Any other non-2xx response. `message` is extracted from the JSON
    /// body when possible, otherwise the raw body text.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The request was abandoned because its owner shut down.
    #[error("Request cancelled")]
    Cancelled,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the server rejected the credential (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if no response was received at all.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Transport(e) => e.status().is_none(),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Server { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// The HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
