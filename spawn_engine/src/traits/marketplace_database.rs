use spawn_common::Kobo;
use thiserror::Error;

use crate::{
    db_types::{ItemId, MeetingDetails, NewOrder, Order, OrderAction, OrderId, TrackingStatus, UserId},
    rating::{InvalidRating, StarRating},
    traits::{CatalogManagement, CreatedOrder, OrderManagement, RatedOrder},
};

/// This trait defines the highest level of behaviour for backends supporting the Spawn escrow engine.
///
/// Every method that changes an order is a single atomic transaction. The guards described on each method are
/// evaluated inside that transaction, and if any of them fail, nothing is written.
///
/// Implementations must never read a value, decide, and then write it back in a separate statement. Quantities and
/// statuses are changed with conditional updates so that concurrent requests cannot both succeed.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderManagement + CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a new `paid` order for a verified payment, and in the same transaction removes `quantity` units from
    /// the item's stock. The item is marked as `sold` when the stock reaches zero.
    ///
    /// ## Failure modes:
    /// - The item does not exist: [`MarketplaceError::ItemNotFound`]
    /// - The buyer is the seller of the item: [`MarketplaceError::CannotBuyOwnItem`]
    /// - There is not enough stock: [`MarketplaceError::InventoryExhausted`]
    /// - `paid_amount` is given and is less than unit price × quantity: [`MarketplaceError::PaymentShortfall`]
    /// - The payment reference has already been used: [`MarketplaceError::DuplicatePaymentReference`]
    async fn create_order_for_item(&self, order: NewOrder) -> Result<CreatedOrder, MarketplaceError>;

    /// `paid` → `meeting_scheduled`. Only the buyer may schedule the meeting.
    async fn schedule_meeting(
        &self,
        order_id: OrderId,
        buyer: UserId,
        meeting: MeetingDetails,
    ) -> Result<Order, MarketplaceError>;

    /// `meeting_scheduled` → `completed`. Only the buyer may release the funds.
    async fn release_funds(&self, order_id: OrderId, buyer: UserId) -> Result<Order, MarketplaceError>;

    /// `meeting_scheduled` → `refund_requested` → `refunded`.
    ///
    /// Both steps are recorded in the status history. The ordered quantity is returned to the item's stock and the
    /// item becomes `available` again.
    async fn retract_funds(&self, order_id: OrderId, buyer: UserId, reason: &str) -> Result<Order, MarketplaceError>;

    /// Records the buyer's rating on a `completed` order and folds it into the seller's running average.
    ///
    /// An order can be rated once. A second attempt fails with [`MarketplaceError::AlreadyRated`].
    async fn rate_seller(
        &self,
        order_id: OrderId,
        buyer: UserId,
        rating: StarRating,
    ) -> Result<RatedOrder, MarketplaceError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested item {0} does not exist")]
    ItemNotFound(ItemId),
    #[error("The requested user {0} does not exist")]
    UserNotFound(UserId),
    #[error("User {user} is not the buyer of order {order_id}")]
    NotOrderBuyer { order_id: OrderId, user: UserId },
    #[error("Cannot {action} on order {order_id}, because it is {status}")]
    InvalidTransition { order_id: OrderId, status: TrackingStatus, action: OrderAction },
    #[error("Order {0} has already been rated")]
    AlreadyRated(OrderId),
    #[error("Sellers cannot buy their own items")]
    CannotBuyOwnItem,
    #[error("Item {item_id} only has {available} units available, but {requested} were requested")]
    InventoryExhausted { item_id: ItemId, requested: i64, available: i64 },
    #[error("The payment of {paid} does not cover the order total of {expected}")]
    PaymentShortfall { expected: Kobo, paid: Kobo },
    #[error("The payment reference {0} has already been used for another order")]
    DuplicatePaymentReference(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("The record was modified by another request. Please try again.")]
    ConcurrentModification,
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}

impl From<InvalidRating> for MarketplaceError {
    fn from(e: InvalidRating) -> Self {
        MarketplaceError::InvalidValue(e.to_string())
    }
}
