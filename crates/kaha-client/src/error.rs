//! # Client Error Types
//!
//! Error types for everything that talks to the POS backend or reads the
//! terminal's configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Domain              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Core(CoreError)        │ │
//! │  │  ConfigLoad     │  │  Server         │  │  (empty cart, stock     │ │
//! │  │                 │  │  Decode         │  │   shortfall, tender...) │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Transport errors are retryable; the cart is never touched by them.    │
//! │  Domain errors are rejections: fix the cart, then try again.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kaha_core::CoreError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Shown when the backend gave us nothing better to say.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Client error type covering every failure outside the pure engine.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoad(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never produced a response (connect, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a failure.
    ///
    /// `message` is the backend's own text when it sent one.
    #[error("Server error{}: {message}", status_suffix(.status))]
    Server { status: Option<u16>, message: String },

    /// The backend answered with a body we could not understand.
    #[error("Unexpected response from backend: {0}")]
    Decode(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// The engine refused the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoad(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoad(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidConfig(format!("invalid URL: {}", err))
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the same request may succeed when sent again.
    ///
    /// ## Retryable Errors
    /// - Network failures (connect, timeout)
    /// - Server errors (5xx, or a failure with no status)
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Client errors (4xx)
    /// - Domain rejections (the cart must change first)
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(err) => !err.is_builder() && !err.is_decode(),
            ClientError::Server { status, .. } => status.map_or(true, |s| s >= 500),
            ClientError::Decode(_)
            | ClientError::InvalidConfig(_)
            | ClientError::ConfigLoad(_)
            | ClientError::Core(_) => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(self, ClientError::InvalidConfig(_) | ClientError::ConfigLoad(_))
    }

    /// Returns true if the engine, not the network, refused the operation.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Core(_))
    }

    /// Text for the cashier.
    ///
    /// The backend's message is passed through verbatim; transport failures
    /// collapse to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::Core(err) => err.to_string(),
            ClientError::Http(err) if err.is_connect() => {
                "Cannot reach the POS server. Check the connection and try again.".to_string()
            }
            ClientError::Http(err) if err.is_timeout() => {
                "The POS server took too long to respond. Please try again.".to_string()
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::Server { status: Some(503), message: "down".into() }.is_retryable());
        assert!(ClientError::Server { status: None, message: "failed".into() }.is_retryable());

        assert!(!ClientError::Server { status: Some(422), message: "bad".into() }.is_retryable());
        assert!(!ClientError::InvalidConfig("bad config".into()).is_retryable());
        assert!(!ClientError::Core(CoreError::EmptyCart).is_retryable());
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ClientError::Server {
            status: Some(400),
            message: "Transaction number already used".into(),
        };
        assert_eq!(err.user_message(), "Transaction number already used");

        let err = ClientError::Server { status: Some(500), message: "  ".into() };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);

        let err = ClientError::Decode("expected value".into());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_rejections_keep_domain_text() {
        let err = ClientError::from(CoreError::EmptyCart);
        assert!(err.is_rejection());
        assert_eq!(err.user_message(), CoreError::EmptyCart.to_string());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Server { status: Some(404), message: "Sale not found".into() };
        assert_eq!(err.to_string(), "Server error (404): Sale not found");

        let err = ClientError::Server { status: None, message: "failed".into() };
        assert_eq!(err.to_string(), "Server error: failed");
        assert!(ClientError::ConfigLoad("missing".into()).is_config_error());
    }
}
