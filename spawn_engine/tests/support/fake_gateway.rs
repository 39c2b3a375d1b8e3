use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::{json, Value};
use spawn_common::{Kobo, NAIRA_CURRENCY_CODE};
use spawn_engine::{
    db_types::{ItemId, UserId},
    payment_objects::{PaymentInitialization, PaymentRequest, PaymentStatus, PaymentVerification},
    PaymentGateway,
    PaymentGatewayError,
};

/// An in-memory payment provider. Payments are registered up front, and refunds and transfers are recorded so that
/// tests can inspect them.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    payments: Arc<Mutex<HashMap<String, PaymentVerification>>>,
    refunds: Arc<Mutex<Vec<String>>>,
    transfers: Arc<Mutex<Vec<(String, Kobo)>>>,
    checkouts: Arc<Mutex<Vec<PaymentRequest>>>,
    delay: Option<Duration>,
}

impl FakeGateway {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn add_payment(&self, reference: &str, status: PaymentStatus, amount: Kobo, metadata: Value) {
        let verification = PaymentVerification {
            reference: reference.to_string(),
            status,
            amount,
            currency: NAIRA_CURRENCY_CODE.to_string(),
            metadata,
        };
        self.payments.lock().unwrap().insert(reference.to_string(), verification);
    }

    pub fn add_successful_payment(&self, reference: &str, amount: Kobo) {
        self.add_payment(reference, PaymentStatus::Success, amount, Value::Null);
    }

    pub fn add_checkout_payment(&self, reference: &str, amount: Kobo, buyer: UserId, item: ItemId, quantity: i64) {
        let metadata = json!({ "buyer_id": buyer, "item_id": item, "quantity": quantity });
        self.add_payment(reference, PaymentStatus::Success, amount, metadata);
    }

    pub fn refunds(&self) -> Vec<String> {
        self.refunds.lock().unwrap().clone()
    }

    pub fn transfers(&self) -> Vec<(String, Kobo)> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn checkouts(&self) -> Vec<PaymentRequest> {
        self.checkouts.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl PaymentGateway for FakeGateway {
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, PaymentGatewayError> {
        self.pause().await;
        let payment = self.payments.lock().unwrap().get(reference).cloned();
        payment.ok_or_else(|| PaymentGatewayError::UnknownReference(reference.to_string()))
    }

    async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentInitialization, PaymentGatewayError> {
        self.pause().await;
        let mut checkouts = self.checkouts.lock().unwrap();
        let reference = format!("checkout-{}", checkouts.len() + 1);
        checkouts.push(request);
        Ok(PaymentInitialization {
            authorization_url: format!("https://checkout.example.com/{reference}"),
            access_code: format!("access-{reference}"),
            reference,
        })
    }

    async fn refund_payment(&self, reference: &str) -> Result<(), PaymentGatewayError> {
        self.refunds.lock().unwrap().push(reference.to_string());
        Ok(())
    }

    async fn transfer_to_seller(&self, recipient: &str, amount: Kobo, _reason: &str) -> Result<(), PaymentGatewayError> {
        self.transfers.lock().unwrap().push((recipient.to_string(), amount));
        Ok(())
    }
}
