use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use spawn_common::Kobo;

use crate::{
    config::PaystackConfig,
    data_objects::{
        InitializeTransaction,
        PaystackResponse,
        PaystackTransaction,
        Refund,
        RefundRequest,
        TransactionAuthorization,
        Transfer,
        TransferRequest,
    },
    PaystackApiError,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    /// Sends a request to Paystack and unwraps the response envelope. A `status: false` envelope is reported as
    /// [`PaystackApiError::Declined`].
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            let envelope = response.json::<PaystackResponse<T>>().await?;
            if !envelope.status {
                return Err(PaystackApiError::Declined(envelope.message));
            }
            envelope.data.ok_or_else(|| PaystackApiError::JsonError(format!("No data in response. {}", envelope.message)))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await?;
            // Paystack puts a human-readable reason in the `message` field of error responses
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or(text);
            Err(PaystackApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub async fn verify_transaction(&self, reference: &str) -> Result<PaystackTransaction, PaystackApiError> {
        let reference = valid_reference(reference)?;
        let path = format!("/transaction/verify/{reference}");
        debug!("💳️ Verifying transaction {reference}");
        let tx = self.rest_query::<PaystackTransaction, ()>(Method::GET, &path, None).await?;
        info!("💳️ Transaction {reference} is {} for {} {}", tx.status, tx.amount, tx.currency);
        Ok(tx)
    }

    pub async fn initialize_transaction(
        &self,
        email: &str,
        amount: Kobo,
        metadata: Value,
    ) -> Result<TransactionAuthorization, PaystackApiError> {
        let body = InitializeTransaction {
            email: email.to_string(),
            amount,
            currency: self.config.currency.clone(),
            callback_url: self.config.callback_url.clone(),
            metadata,
        };
        debug!("💳️ Initializing a transaction for {amount}");
        let auth = self
            .rest_query::<TransactionAuthorization, InitializeTransaction>(
                Method::POST,
                "/transaction/initialize",
                Some(body),
            )
            .await?;
        info!("💳️ Initialized transaction {} for {amount}", auth.reference);
        Ok(auth)
    }

    /// Refunds the full amount of the transaction with the given reference back to the customer.
    pub async fn refund(&self, reference: &str, note: Option<String>) -> Result<Refund, PaystackApiError> {
        let reference = valid_reference(reference)?;
        let body = RefundRequest { transaction: reference.to_string(), merchant_note: note };
        debug!("💳️ Requesting a refund for {reference}");
        let refund = self.rest_query::<Refund, RefundRequest>(Method::POST, "/refund", Some(body)).await?;
        info!("💳️ Refund of {} for {reference} is {}", refund.amount, refund.status);
        Ok(refund)
    }

    /// Pays `amount` out of the merchant balance to a transfer recipient (a `RCP_` code).
    pub async fn transfer(&self, recipient: &str, amount: Kobo, reason: &str) -> Result<Transfer, PaystackApiError> {
        if amount.value() <= 0 {
            return Err(PaystackApiError::Declined(format!("Cannot transfer {amount}")));
        }
        let body = TransferRequest::from_balance(recipient, amount, reason);
        debug!("💳️ Transferring {amount} to {recipient}");
        let transfer = self.rest_query::<Transfer, TransferRequest>(Method::POST, "/transfer", Some(body)).await?;
        info!("💳️ Transfer {} of {amount} to {recipient} is {}", transfer.transfer_code, transfer.status);
        Ok(transfer)
    }
}

/// References end up in URL paths, so only accept the characters Paystack itself generates.
fn valid_reference(reference: &str) -> Result<&str, PaystackApiError> {
    let reference = reference.trim();
    let valid = !reference.is_empty() &&
        reference.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '=' | ':'));
    if valid {
        Ok(reference)
    } else {
        Err(PaystackApiError::InvalidReference(reference.to_string()))
    }
}
