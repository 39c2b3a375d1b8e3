use std::fmt::Display;

use serde::{Deserialize, Serialize};
use spawn_engine::db_types::ItemId;

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentParams {
    pub reference: String,
    /// The storefront has historically sent this as `itemID`
    #[serde(alias = "itemID")]
    pub item_id: ItemId,
    #[serde(default = "one")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentParams {
    #[serde(alias = "productId")]
    pub item_id: ItemId,
    #[serde(default = "one")]
    pub quantity: i64,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetractFundsParams {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSellerParams {
    pub rating: i64,
}

/// Paystack appends both `reference` and `trxref` to the callback URL. They carry the same value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentCallbackQuery {
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

impl PaymentCallbackQuery {
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref().or(self.trxref.as_deref()).map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
