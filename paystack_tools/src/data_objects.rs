use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spawn_common::Kobo;

/// Every Paystack response is wrapped in this envelope. `status` is false when Paystack declined the request.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaystackTransaction {
    pub id: i64,
    pub reference: String,
    /// `success`, `failed`, `abandoned`, `ongoing`, `pending`, `processing`, `queued` or `reversed`
    pub status: String,
    pub amount: Kobo,
    pub currency: String,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    /// Whatever metadata was attached when the transaction was initialized. Paystack returns an empty string when
    /// there is none.
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    pub amount: Kobo,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    /// The reference (or id) of the transaction being refunded
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Refund {
    pub id: i64,
    pub status: String,
    pub amount: Kobo,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    pub source: String,
    pub amount: Kobo,
    pub recipient: String,
    pub reason: String,
}

impl TransferRequest {
    pub fn from_balance(recipient: &str, amount: Kobo, reason: &str) -> Self {
        Self { source: "balance".to_string(), amount, recipient: recipient.to_string(), reason: reason.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transfer {
    pub transfer_code: String,
    pub status: String,
    pub amount: Kobo,
    pub currency: String,
    #[serde(default)]
    pub reference: Option<String>,
}
