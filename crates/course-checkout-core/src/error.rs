//! Error Types

use thiserror::Error;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Shown when the billing API gives us nothing better to say
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Checkout error types
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Billing/progress API answered with a non-success status
    #[error("Billing API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Request never reached the API or the connection dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation requires a signed-in user
    #[error("Not authenticated")]
    Unauthenticated,

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Check if error is retryable
    ///
    /// Informational only: the widget never retries on its own.
    pub const fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Network(_) => true,
            CheckoutError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for a toast
    ///
    /// Prefers the server-provided message, falling back to a generic one.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Api { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            _ => GENERIC_ERROR_MESSAGE.into(),
        }
    }
}
