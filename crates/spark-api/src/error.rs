use thiserror::Error;

/// Top-level error type for the `spark-api` crate.
///
/// Covers every failure mode of a single cloud request: a missing token,
/// a rejected token, transport failures, and malformed or empty payloads.
/// `spark-core` maps these into the device-session error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No token was supplied. Raised before any network call.
    #[error("Please include an authtoken for your request")]
    MissingToken,

    /// The cloud rejected the bearer token (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A device id or capability name that cannot be a path segment.
    #[error("Invalid device or capability name: {segment:?}")]
    InvalidSegment { segment: String },

    // ── Cloud ───────────────────────────────────────────────────────
    /// The requested device or capability does not exist (HTTP 404).
    #[error("Not found: {path}")]
    NotFound { path: String, message: String },

    /// Any other error reported by the cloud, either through a non-2xx
    /// status or an `{"ok": false, "error": ...}` body.
    #[error("Cloud API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The response carried no body at all.
    #[error("No data returned by the API.")]
    EmptyResponse,

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the token is missing or was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Authentication { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the request never produced a cloud response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidUrl(_))
    }
}
