// ── Core error types ──
//
// User-facing errors from spark-core. Consumers never see HTTP status codes
// or JSON parse failures directly: the `From<spark_api::Error>` impl
// translates transport-layer errors into domain variants, and per-call
// failures wrap the transport error as their source.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Construction errors ──────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    #[error("Cannot reach the spark Cloud: {reason}")]
    Transport { reason: String },

    // ── Capability errors ────────────────────────────────────────────
    #[error("Variable '{name}' is not registered with the spark Cloud for device {device}")]
    UnknownVariable { device: String, name: String },

    #[error("Function '{name}' is not registered with the spark Cloud for device {device}")]
    UnknownFunction { device: String, name: String },

    // ── Per-call errors ──────────────────────────────────────────────
    #[error("Reading '{name}' failed: {source}")]
    RemoteRead {
        name: String,
        #[source]
        source: spark_api::Error,
    },

    #[error("Calling '{name}' failed: {source}")]
    RemoteExecution {
        name: String,
        #[source]
        source: spark_api::Error,
    },

    // ── Session lifecycle ────────────────────────────────────────────
    #[error("Session for device {id} is not connected yet")]
    NotReady { id: String },

    #[error("Session for device {id} failed to connect: {reason}")]
    SessionFailed { id: String, reason: String },

    #[error("Session for device {id} has been dropped")]
    SessionClosed { id: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Cache / configuration ────────────────────────────────────────
    #[error("Device cache error at {path}: {message}")]
    Cache { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for the two per-call capability lookups that fail
    /// before any request is issued.
    pub fn is_unknown_capability(&self) -> bool {
        matches!(
            self,
            Self::UnknownVariable { .. } | Self::UnknownFunction { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<spark_api::Error> for CoreError {
    fn from(err: spark_api::Error) -> Self {
        match err {
            spark_api::Error::MissingToken => CoreError::Auth {
                message: "no access token supplied".into(),
            },
            spark_api::Error::Authentication { message } => CoreError::Auth { message },
            spark_api::Error::NotFound { path, .. } => CoreError::DeviceNotFound {
                id: path.rsplit('/').next().unwrap_or_default().to_owned(),
            },
            spark_api::Error::Transport(e) => CoreError::Transport {
                reason: e.to_string(),
            },
            spark_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            err @ spark_api::Error::InvalidSegment { .. } => CoreError::Api {
                message: err.to_string(),
                status: None,
            },
            spark_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            err @ spark_api::Error::EmptyResponse => CoreError::Api {
                message: err.to_string(),
                status: None,
            },
            spark_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_device_id() {
        let err = CoreError::from(spark_api::Error::NotFound {
            path: "/v1/devices/a2".into(),
            message: String::new(),
        });
        assert!(matches!(err, CoreError::DeviceNotFound { ref id } if id == "a2"));
    }

    #[test]
    fn missing_token_is_auth() {
        let err = CoreError::from(spark_api::Error::MissingToken);
        assert!(matches!(err, CoreError::Auth { .. }));
    }

    #[test]
    fn unknown_capability_predicate() {
        let err = CoreError::UnknownFunction {
            device: "a1".into(),
            name: "brew".into(),
        };
        assert!(err.is_unknown_capability());
        assert!(!CoreError::NotReady { id: "a1".into() }.is_unknown_capability());
    }
}
