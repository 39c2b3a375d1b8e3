use log::*;
use paystack_tools::{PaystackApi, PaystackApiError, PaystackConfig, PaystackTransaction};
use serde_json::Value;
use spawn_common::Kobo;
use spawn_engine::{
    payment_objects::{PaymentInitialization, PaymentRequest, PaymentStatus, PaymentVerification},
    PaymentGateway,
    PaymentGatewayError,
};

use crate::errors::ServerError;

/// The escrow engine's view of Paystack.
#[derive(Clone)]
pub struct PaystackGateway {
    api: PaystackApi,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig) -> Result<Self, ServerError> {
        let api = PaystackApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &PaystackApi {
        &self.api
    }
}

impl PaymentGateway for PaystackGateway {
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, PaymentGatewayError> {
        let tx = self.api.verify_transaction(reference).await.map_err(gateway_error)?;
        Ok(verification_from_transaction(tx))
    }

    async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentInitialization, PaymentGatewayError> {
        let metadata = serde_json::to_value(request.metadata)
            .map_err(|e| PaymentGatewayError::InvalidResponse(format!("Could not encode metadata. {e}")))?;
        let auth = self.api.initialize_transaction(&request.email, request.amount, metadata).await.map_err(gateway_error)?;
        Ok(PaymentInitialization {
            authorization_url: auth.authorization_url,
            access_code: auth.access_code,
            reference: auth.reference,
        })
    }

    async fn refund_payment(&self, reference: &str) -> Result<(), PaymentGatewayError> {
        let _ = self.api.refund(reference, None).await.map_err(gateway_error)?;
        Ok(())
    }

    async fn transfer_to_seller(&self, recipient: &str, amount: Kobo, reason: &str) -> Result<(), PaymentGatewayError> {
        let _ = self.api.transfer(recipient, amount, reason).await.map_err(gateway_error)?;
        Ok(())
    }
}

pub fn verification_from_transaction(tx: PaystackTransaction) -> PaymentVerification {
    let status = serde_json::from_value::<PaymentStatus>(Value::String(tx.status.to_lowercase())).unwrap_or_else(|e| {
        warn!("💳️ Paystack reported an unexpected status '{}' for {}. {e}", tx.status, tx.reference);
        PaymentStatus::Unknown
    });
    PaymentVerification { reference: tx.reference, status, amount: tx.amount, currency: tx.currency, metadata: tx.metadata }
}

pub fn gateway_error(e: PaystackApiError) -> PaymentGatewayError {
    match e {
        PaystackApiError::Timeout | PaystackApiError::RestResponseError(_) | PaystackApiError::Initialization(_) => {
            PaymentGatewayError::Unreachable(e.to_string())
        },
        PaystackApiError::QueryError { status: 404, .. } | PaystackApiError::InvalidReference(_) => {
            PaymentGatewayError::UnknownReference(e.to_string())
        },
        PaystackApiError::QueryError { status, .. } if status >= 500 => PaymentGatewayError::Unreachable(e.to_string()),
        PaystackApiError::QueryError { .. } | PaystackApiError::Declined(_) => PaymentGatewayError::Rejected(e.to_string()),
        PaystackApiError::JsonError(_) => PaymentGatewayError::InvalidResponse(e.to_string()),
    }
}
