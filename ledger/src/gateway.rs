//! Payment gateway contract.
//!
//! The ledger never talks to a card network. It validates and initiates
//! payments through this trait and receives the outcome asynchronously as
//! `payment.confirmed` / `payment.failed` callbacks routed to
//! [`TransactionProcessor::on_payment_confirmed`](crate::TransactionProcessor::on_payment_confirmed)
//! and
//! [`TransactionProcessor::on_payment_failed`](crate::TransactionProcessor::on_payment_failed).

use async_trait::async_trait;
use serde::Serialize;

use nocta_core::AccountId;

/// A payment the gateway should collect.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    /// The purchasing account.
    pub account_id: AccountId,
    /// The catalog package being bought.
    pub package_id: String,
    /// Price in euro cents.
    pub amount_cents: u64,
    /// Credits granted on confirmation, for the gateway's receipt line.
    pub credits_amount: u64,
}

/// Errors from the payment collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The gateway rejected the amount or request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Transport-level failure talking to the gateway.
    #[error("transport: {0}")]
    Transport(String),

    /// No gateway is configured for this deployment.
    #[error("payment gateway not configured")]
    NotConfigured,
}

/// The external payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Check that the gateway will accept a charge of `amount_cents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is outside the gateway's bounds or
    /// the gateway is unreachable.
    async fn validate_amount(&self, amount_cents: u64) -> Result<(), GatewayError>;

    /// Start collecting a payment. Returns the gateway's payment reference,
    /// which later identifies the confirm/fail callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway refuses or is unreachable.
    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<String, GatewayError>;
}
