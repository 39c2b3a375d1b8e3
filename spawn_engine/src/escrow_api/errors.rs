use thiserror::Error;

use crate::traits::{MarketplaceError, PaymentGatewayError};

/// The errors the order flow reports to its callers.
///
/// Apart from `DependencyFailure`, every error is raised before anything was written.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    InventoryExhausted(String),
    #[error("Payment could not be verified. {0}")]
    PaymentNotVerified(String),
    #[error("A downstream service failed. {0}")]
    DependencyFailure(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<MarketplaceError> for OrderFlowError {
    fn from(e: MarketplaceError) -> Self {
        use MarketplaceError::*;
        let msg = e.to_string();
        match e {
            OrderNotFound(_) | ItemNotFound(_) | UserNotFound(_) => OrderFlowError::NotFound(msg),
            NotOrderBuyer { .. } => OrderFlowError::Unauthorized(msg),
            InvalidTransition { .. } | AlreadyRated(_) | DuplicatePaymentReference(_) | ConcurrentModification => {
                OrderFlowError::InvalidState(msg)
            },
            CannotBuyOwnItem | InvalidValue(_) => OrderFlowError::ValidationError(msg),
            InventoryExhausted { .. } => OrderFlowError::InventoryExhausted(msg),
            PaymentShortfall { .. } => OrderFlowError::PaymentNotVerified(msg),
            DatabaseError(_) => OrderFlowError::DatabaseError(msg),
        }
    }
}

impl From<PaymentGatewayError> for OrderFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        OrderFlowError::DependencyFailure(e.to_string())
    }
}
