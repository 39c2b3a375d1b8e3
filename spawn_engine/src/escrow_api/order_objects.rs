use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Item, ItemId, MeetingDetails, Order, TrackingStatus, User, UserId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<UserId>,
    pub seller_id: Option<UserId>,
    pub item_id: Option<ItemId>,
    #[serde(default)]
    pub statuses: Vec<TrackingStatus>,
}

impl OrderQueryFilter {
    pub fn with_buyer(mut self, buyer: UserId) -> Self {
        self.buyer_id = Some(buyer);
        self
    }

    pub fn with_seller(mut self, seller: UserId) -> Self {
        self.seller_id = Some(seller);
        self
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item_id = Some(item);
        self
    }

    pub fn with_status(mut self, status: TrackingStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() && self.seller_id.is_none() && self.item_id.is_none() && self.statuses.is_empty()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(buyer) = &self.buyer_id {
            write!(f, "buyer: {buyer}. ")?;
        }
        if let Some(seller) = &self.seller_id {
            write!(f, "seller: {seller}. ")?;
        }
        if let Some(item) = &self.item_id {
            write!(f, "item: {item}. ")?;
        }
        if !self.statuses.is_empty() {
            let statuses = self.statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// An order, together with the item it is for and both parties to it.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub item: Item,
    pub buyer: User,
    pub seller: User,
}

impl OrderDetails {
    /// The other party to the order, from `caller`'s point of view.
    pub fn counterparty(&self, caller: UserId) -> &User {
        if caller == self.order.buyer_id {
            &self.seller
        } else {
            &self.buyer
        }
    }
}

/// A buyer's claim that they paid for `quantity` units of `item_id` with the payment identified by `reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseClaim {
    pub reference: String,
    pub item_id: ItemId,
    pub buyer_id: UserId,
    pub quantity: i64,
}

impl PurchaseClaim {
    pub fn new<S: Into<String>>(reference: S, item_id: ItemId, buyer_id: UserId) -> Self {
        Self { reference: reference.into(), item_id, buyer_id, quantity: 1 }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// The meeting a buyer proposes when scheduling the hand-over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub location: String,
    pub time: DateTime<Utc>,
}

impl From<MeetingRequest> for MeetingDetails {
    fn from(value: MeetingRequest) -> Self {
        Self { location: value.location.trim().to_string(), time: value.time }
    }
}

/// The outcome of a payment provider callback.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// The payment was verified and a new order was created.
    Created(Order),
    /// An order already exists for this payment. Providers may call back more than once.
    AlreadyProcessed(Order),
}

impl CallbackOutcome {
    pub fn order(&self) -> &Order {
        match self {
            CallbackOutcome::Created(o) | CallbackOutcome::AlreadyProcessed(o) => o,
        }
    }
}
