use spawn_common::Kobo;
use thiserror::Error;

use crate::escrow_api::payment_objects::{PaymentInitialization, PaymentRequest, PaymentVerification};

/// A payment provider.
///
/// The engine trusts a successful [`PaymentGateway::verify_payment`] as proof that the buyer has paid. Refunds and
/// payouts happen after the order has been committed and are best-effort.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Asks the provider for the outcome of the charge identified by `reference`.
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, PaymentGatewayError>;

    /// Starts a new checkout with the provider.
    async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentInitialization, PaymentGatewayError>;

    /// Returns the full amount of the charge identified by `reference` to the payer.
    async fn refund_payment(&self, reference: &str) -> Result<(), PaymentGatewayError>;

    /// Pays `amount` out to a seller's transfer recipient.
    async fn transfer_to_seller(&self, recipient: &str, amount: Kobo, reason: &str) -> Result<(), PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Could not reach the payment provider: {0}")]
    Unreachable(String),
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("The payment provider does not know about transaction {0}")]
    UnknownReference(String),
    #[error("Could not understand the payment provider's response: {0}")]
    InvalidResponse(String),
}
