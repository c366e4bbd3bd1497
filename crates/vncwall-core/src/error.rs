// ── Core error types ──
//
// User-facing errors from vncwall-core. Front ends never see raw HTTP
// status codes or JSON parse failures; the `From<vncwall_api::Error>` impl
// folds transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach dashboard backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Dashboard backend timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Server not found: {ip}")]
    ServerNotFound { ip: String },

    #[error("List not found: {name}")]
    ListNotFound { name: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vncwall_api::Error> for CoreError {
    fn from(err: vncwall_api::Error) -> Self {
        match err {
            vncwall_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            vncwall_api::Error::Http { status, message } => CoreError::Api {
                message: if message.is_empty() {
                    format!("backend returned HTTP {status}")
                } else {
                    message
                },
                status: Some(status),
            },
            vncwall_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            vncwall_api::Error::Tls(message) => CoreError::Config { message },
            vncwall_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response from backend: {message}"),
                status: None,
            },
        }
    }
}
