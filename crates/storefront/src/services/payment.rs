//! Simulated payment processing.
//!
//! There is no payment provider: a request waits for the configured delay
//! and is then approved with the configured probability.

use chrono::Utc;
use rand::Rng;
use tracing::{info, instrument, warn};

use atelier_core::PaymentStatus;

use crate::config::PaymentConfig;
use crate::error::{Result, ServiceError};
use crate::models::{PaymentReceipt, PaymentRequest};

/// Stand-in for a payment provider.
#[derive(Debug, Clone, Copy)]
pub struct PaymentSimulator {
    config: PaymentConfig,
}

impl PaymentSimulator {
    #[must_use]
    pub const fn new(config: PaymentConfig) -> Self {
        Self { config }
    }

    /// Approval probability, clamped into `0.0..=1.0`.
    fn success_rate(&self) -> f64 {
        let rate = self.config.success_rate;
        if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) }
    }

    /// Wait, then approve or decline `request`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::PaymentDeclined` when the draw fails.
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn process(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        tokio::time::sleep(self.config.delay).await;

        let approved = rand::rng().random_bool(self.success_rate());
        if !approved {
            warn!("Payment declined");
            return Err(ServiceError::PaymentDeclined);
        }

        let receipt = PaymentReceipt {
            transaction_id: format!("txn_{}", Utc::now().timestamp_millis()),
            status: PaymentStatus::Completed,
            amount: request.amount,
        };
        info!(transaction_id = %receipt.transaction_id, "Payment approved");
        Ok(receipt)
    }
}

impl Default for PaymentSimulator {
    fn default() -> Self {
        Self::new(PaymentConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::Price;
    use std::time::Duration;

    fn simulator(success_rate: f64) -> PaymentSimulator {
        PaymentSimulator::new(PaymentConfig {
            delay: Duration::ZERO,
            success_rate,
        })
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            amount: Price::from_cents(4200),
            order_number: Some("VT000042".to_string()),
        }
    }

    #[tokio::test]
    async fn test_always_approves_at_rate_one() {
        let receipt = simulator(1.0).process(&request()).await.unwrap();
        assert!(receipt.transaction_id.starts_with("txn_"));
        assert_eq!(receipt.status, PaymentStatus::Completed);
        assert_eq!(receipt.amount, Price::from_cents(4200));
    }

    #[tokio::test]
    async fn test_always_declines_at_rate_zero() {
        let err = simulator(0.0).process(&request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::PaymentDeclined));
        assert_eq!(err.to_string(), "Payment failed. Please try again.");
    }

    #[tokio::test]
    async fn test_out_of_range_rate_is_clamped() {
        assert!(simulator(7.5).process(&request()).await.is_ok());
        assert!(simulator(f64::NAN).process(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_waits_for_configured_delay() {
        let simulator = PaymentSimulator::new(PaymentConfig {
            delay: Duration::from_millis(30),
            success_rate: 1.0,
        });
        let started = tokio::time::Instant::now();
        simulator.process(&request()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
