use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spawn_common::Kobo;
use spawn_engine::{
    db_types::{
        Item,
        ItemId,
        ItemStatus,
        LegacyStatus,
        MeetingDetails,
        Order,
        OrderId,
        OrderStatusEntry,
        TrackingStatus,
        User,
        UserId,
    },
    order_objects::OrderDetails,
    payment_objects::PaymentInitialization,
    rating::SellerRating,
    RatedOrder,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
    /// Total price, in kobo
    pub price: Kobo,
    pub payment_reference: String,
    pub status: LegacyStatus,
    pub tracking_status: TrackingStatus,
    pub meeting_details: Option<MeetingDetails>,
    pub refund_reason: Option<String>,
    pub seller_rating: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            status: order.status(),
            id: order.id,
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            item_id: order.item_id,
            quantity: order.quantity,
            price: order.price,
            payment_reference: order.payment_reference,
            tracking_status: order.tracking_status,
            meeting_details: order.meeting_details,
            refund_reason: order.refund_reason,
            seller_rating: order.seller_rating,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
    /// Unit price, in kobo
    pub price: Kobo,
    pub location: String,
    pub status: ItemStatus,
}

impl From<Item> for ItemSummary {
    fn from(item: Item) -> Self {
        Self { id: item.id, title: item.title, price: item.price, location: item.location, status: item.status }
    }
}

/// What one party to an order gets to see of the other. Email addresses are never included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: UserId,
    pub username: String,
    pub rating: f64,
    pub rating_count: i64,
}

impl From<&User> for PartySummary {
    fn from(user: &User) -> Self {
        Self { id: user.id, username: user.username.clone(), rating: user.rating, rating_count: user.rating_count }
    }
}

/// An order as seen by `viewer`: the order fields, the item, and the other party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub item: ItemSummary,
    pub counterparty: PartySummary,
}

impl OrderDetailsResponse {
    pub fn for_viewer(details: OrderDetails, viewer: UserId) -> Self {
        let counterparty = PartySummary::from(details.counterparty(viewer));
        Self { order: details.order.into(), item: details.item.into(), counterparty }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPaymentResponse {
    pub success: bool,
    pub order: OrderResponse,
    pub redirect_url: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntryResponse {
    pub status: TrackingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<OrderStatusEntry> for StatusEntryResponse {
    fn from(entry: OrderStatusEntry) -> Self {
        Self { status: entry.status, created_at: entry.created_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedOrderResponse {
    pub order: OrderResponse,
    pub seller_rating: SellerRating,
}

impl From<RatedOrder> for RatedOrderResponse {
    fn from(rated: RatedOrder) -> Self {
        Self { order: rated.order.into(), seller_rating: rated.seller_rating }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitializationResponse {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

impl From<PaymentInitialization> for PaymentInitializationResponse {
    fn from(init: PaymentInitialization) -> Self {
        Self { authorization_url: init.authorization_url, access_code: init.access_code, reference: init.reference }
    }
}
