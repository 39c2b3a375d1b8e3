use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use spawn_common::Kobo;

use crate::db_types::{ItemId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    Abandoned,
    Ongoing,
    Pending,
    Processing,
    Queued,
    Reversed,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Abandoned => "abandoned",
            PaymentStatus::Ongoing => "ongoing",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Queued => "queued",
            PaymentStatus::Reversed => "reversed",
            PaymentStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The buyer, item and quantity a checkout was started for. This travels with the transaction through the payment
/// provider, so that the callback knows what was bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseMetadata {
    pub buyer_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
}

/// What the payment provider reports about a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: Kobo,
    pub currency: String,
    #[serde(default)]
    pub metadata: Value,
}

impl PaymentVerification {
    /// Extracts the purchase details embedded when the checkout was initialized. Providers return metadata either as
    /// an object or as a JSON-encoded string.
    pub fn purchase_metadata(&self) -> Option<PurchaseMetadata> {
        match &self.metadata {
            Value::Object(_) => serde_json::from_value(self.metadata.clone()).ok(),
            Value::String(s) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }
}

/// A request to start a checkout with the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub email: String,
    pub amount: Kobo,
    pub metadata: PurchaseMetadata,
}

/// The provider's response to a new checkout. The buyer is sent to `authorization_url` to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitialization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}
