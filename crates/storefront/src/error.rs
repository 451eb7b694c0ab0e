//! Unified error type for every storefront service.
//!
//! Gateway failures are folded into [`ServiceError`] at the service boundary;
//! callers never see a raw [`GatewayError`] except as an error `source`.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Message used when the gateway cannot be reached.
pub const UNAVAILABLE_MESSAGE: &str = "Service unavailable";

/// Message returned for a declined payment.
pub const PAYMENT_DECLINED_MESSAGE: &str = "Payment failed. Please try again.";

/// Service-level error type for the storefront.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The record gateway could not be reached.
    #[error("Service unavailable")]
    Unavailable,

    /// The gateway rejected the call or its response could not be used.
    ///
    /// `message` is the gateway's own message when it supplied one, otherwise
    /// an operation-specific fallback such as `"Failed to load cart"`.
    #[error("{message}")]
    Gateway {
        message: String,
        #[source]
        source: Option<GatewayError>,
    },

    /// An ID lookup found nothing.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A conditional write kept losing to concurrent writers.
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// Caller-supplied data was rejected before any remote call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The simulated payment was declined.
    #[error("Payment failed. Please try again.")]
    PaymentDeclined,
}

impl ServiceError {
    /// Fold a gateway error into a service error.
    ///
    /// Keeps the gateway's message when it rejected the call with one and
    /// falls back to `fallback` for transport or decode failures.
    #[must_use]
    pub fn gateway(err: GatewayError, fallback: &str) -> Self {
        match err {
            GatewayError::Unavailable(_) => Self::Unavailable,
            GatewayError::Rejected(Some(message)) => Self::Gateway {
                source: Some(GatewayError::Rejected(Some(message.clone()))),
                message,
            },
            other => Self::Gateway {
                message: fallback.to_string(),
                source: Some(other),
            },
        }
    }

    /// A gateway-level failure with no underlying error (e.g. a per-record
    /// create failure reported inside a successful envelope).
    #[must_use]
    pub fn gateway_message(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            source: None,
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        Self::gateway(err, "Gateway request failed")
    }
}

/// Result type alias for `ServiceError`.
pub type Result<T> = std::result::Result<T, ServiceError>;
