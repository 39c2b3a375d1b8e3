use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spawn_common::Kobo;
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion from string: {0}")]
pub struct ConversionError(pub String);

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim_start_matches('#')
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| ConversionError(format!("'{s}' is not a valid {}: {e}", stringify!($name))))
            }
        }
    };
}

id_type!(OrderId);
id_type!(ItemId);
id_type!(UserId);

//--------------------------------------   TrackingStatus     ---------------------------------------------------------
/// The authoritative lifecycle state of an order.
///
/// ```text
///  paid ──▶ meeting_scheduled ──▶ completed
///                    │
///                    └──▶ refund_requested ──▶ refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    /// Payment has been verified and the item reserved.
    Paid,
    /// The buyer has arranged a meeting with the seller.
    MeetingScheduled,
    /// The buyer released the funds to the seller. Terminal.
    Completed,
    /// The buyer asked for their money back. Transient; always followed by `Refunded`.
    RefundRequested,
    /// The funds were returned and the inventory restored. Terminal.
    Refunded,
}

impl TrackingStatus {
    pub fn legacy_status(&self) -> LegacyStatus {
        match self {
            TrackingStatus::Paid | TrackingStatus::MeetingScheduled | TrackingStatus::RefundRequested => {
                LegacyStatus::Pending
            },
            TrackingStatus::Completed => LegacyStatus::Completed,
            TrackingStatus::Refunded => LegacyStatus::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackingStatus::Completed | TrackingStatus::Refunded)
    }

    /// Only forward edges of the lifecycle graph are allowed.
    pub fn can_transition_to(&self, next: TrackingStatus) -> bool {
        use TrackingStatus::*;
        matches!(
            (self, next),
            (Paid, MeetingScheduled) |
                (MeetingScheduled, Completed) |
                (MeetingScheduled, RefundRequested) |
                (RefundRequested, Refunded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Paid => "paid",
            TrackingStatus::MeetingScheduled => "meeting_scheduled",
            TrackingStatus::Completed => "completed",
            TrackingStatus::RefundRequested => "refund_requested",
            TrackingStatus::Refunded => "refunded",
        }
    }
}

impl Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(Self::Paid),
            "meeting_scheduled" => Ok(Self::MeetingScheduled),
            "completed" => Ok(Self::Completed),
            "refund_requested" => Ok(Self::RefundRequested),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid tracking status: {s}"))),
        }
    }
}

//--------------------------------------    LegacyStatus      ---------------------------------------------------------
/// The coarse status older clients display. Never stored; always derived from [`TrackingStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Display for LegacyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegacyStatus::Pending => write!(f, "pending"),
            LegacyStatus::Completed => write!(f, "completed"),
            LegacyStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------     ItemStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Sold,
}

impl ItemStatus {
    pub fn for_quantity(quantity: i64) -> Self {
        if quantity > 0 {
            ItemStatus::Available
        } else {
            ItemStatus::Sold
        }
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Available => write!(f, "available"),
            ItemStatus::Sold => write!(f, "sold"),
        }
    }
}

//--------------------------------------     OrderAction      ---------------------------------------------------------
/// A buyer-driven step in the order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    ScheduleMeeting,
    ReleaseFunds,
    RetractFunds,
    RateSeller,
}

impl OrderAction {
    /// The status an order must be in for this action to be accepted.
    pub fn required_status(&self) -> TrackingStatus {
        match self {
            OrderAction::ScheduleMeeting => TrackingStatus::Paid,
            OrderAction::ReleaseFunds | OrderAction::RetractFunds => TrackingStatus::MeetingScheduled,
            OrderAction::RateSeller => TrackingStatus::Completed,
        }
    }

    /// The final status after the action completes. Rating leaves the status untouched.
    pub fn target_status(&self) -> TrackingStatus {
        match self {
            OrderAction::ScheduleMeeting => TrackingStatus::MeetingScheduled,
            OrderAction::ReleaseFunds => TrackingStatus::Completed,
            OrderAction::RetractFunds => TrackingStatus::Refunded,
            OrderAction::RateSeller => TrackingStatus::Completed,
        }
    }
}

impl Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAction::ScheduleMeeting => write!(f, "schedule a meeting"),
            OrderAction::ReleaseFunds => write!(f, "release funds"),
            OrderAction::RetractFunds => write!(f, "retract funds"),
            OrderAction::RateSeller => write!(f, "rate the seller"),
        }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetails {
    pub location: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
    /// The total price paid for the order (unit price × quantity)
    pub price: Kobo,
    pub payment_reference: String,
    pub tracking_status: TrackingStatus,
    pub meeting_details: Option<MeetingDetails>,
    pub refund_reason: Option<String>,
    pub seller_rating: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn status(&self) -> LegacyStatus {
        self.tracking_status.legacy_status()
    }

    pub fn is_party(&self, user: UserId) -> bool {
        self.buyer_id == user || self.seller_id == user
    }
}

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let location: Option<String> = row.try_get("meeting_location")?;
        let time: Option<DateTime<Utc>> = row.try_get("meeting_time")?;
        let meeting_details = match (location, time) {
            (Some(location), Some(time)) => Some(MeetingDetails { location, time }),
            _ => None,
        };
        Ok(Self {
            id: row.try_get("id")?,
            buyer_id: row.try_get("buyer_id")?,
            seller_id: row.try_get("seller_id")?,
            item_id: row.try_get("item_id")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            payment_reference: row.try_get("payment_reference")?,
            tracking_status: row.try_get("tracking_status")?,
            meeting_details,
            refund_reason: row.try_get("refund_reason")?,
            seller_rating: row.try_get("seller_rating")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// The data needed to create an order once a payment has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub payment_reference: String,
    /// The amount the payment provider confirmed. When present, it must cover the total price.
    pub paid_amount: Option<Kobo>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(buyer_id: UserId, item_id: ItemId, payment_reference: S) -> Self {
        Self { buyer_id, item_id, quantity: 1, payment_reference: payment_reference.into(), paid_amount: None }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_paid_amount(mut self, amount: Kobo) -> Self {
        self.paid_amount = Some(amount);
        self
    }
}

//--------------------------------------  OrderStatusEntry    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusEntry {
    pub order_id: OrderId,
    pub status: TrackingStatus,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     OrderUpdate      ---------------------------------------------------------
/// The set of mutable order fields a lifecycle transition may write.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub tracking_status: Option<TrackingStatus>,
    pub meeting_details: Option<MeetingDetails>,
    pub refund_reason: Option<String>,
    pub seller_rating: Option<i64>,
}

impl OrderUpdate {
    pub fn is_empty(&self) -> bool {
        self.tracking_status.is_none() &&
            self.meeting_details.is_none() &&
            self.refund_reason.is_none() &&
            self.seller_rating.is_none()
    }

    pub fn with_status(mut self, status: TrackingStatus) -> Self {
        self.tracking_status = Some(status);
        self
    }

    pub fn with_meeting(mut self, meeting: MeetingDetails) -> Self {
        self.meeting_details = Some(meeting);
        self
    }

    pub fn with_refund_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.refund_reason = Some(reason.into());
        self
    }

    pub fn with_seller_rating(mut self, rating: i64) -> Self {
        self.seller_rating = Some(rating);
        self
    }
}

//--------------------------------------         Item         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Unit price
    pub price: Kobo,
    pub location: String,
    pub seller_id: UserId,
    pub quantity: i64,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub price: Kobo,
    pub location: String,
    pub seller_id: UserId,
    pub quantity: i64,
}

//--------------------------------------         User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub rating: f64,
    pub rating_count: i64,
    /// Paystack transfer recipient code for seller payouts
    pub payout_recipient: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub payout_recipient: Option<String>,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, email: S) -> Self {
        Self { username: username.into(), email: email.into(), payout_recipient: None }
    }

    pub fn with_payout_recipient<S: Into<String>>(mut self, recipient: S) -> Self {
        self.payout_recipient = Some(recipient.into());
        self
    }
}
