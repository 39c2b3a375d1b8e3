use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Item, Order, User},
    traits::CreatedOrder,
};

/// Published once an order has been committed after a verified payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub item: Item,
    pub buyer: User,
    pub seller: User,
}

impl From<CreatedOrder> for OrderCreatedEvent {
    fn from(value: CreatedOrder) -> Self {
        let CreatedOrder { order, item, buyer, seller } = value;
        Self { order, item, buyer, seller }
    }
}

/// Published when the buyer releases the funds to the seller. The seller should be paid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsReleasedEvent {
    pub order: Order,
    pub seller: User,
}

impl FundsReleasedEvent {
    pub fn new(order: Order, seller: User) -> Self {
        Self { order, seller }
    }
}

/// Published when an order has been refunded. The buyer's payment should be returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRefundedEvent {
    pub order: Order,
}

impl OrderRefundedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    FundsReleased(FundsReleasedEvent),
    OrderRefunded(OrderRefundedEvent),
}
