use crate::{
    db_types::{Order, OrderId, OrderStatusEntry},
    escrow_api::order_objects::OrderQueryFilter,
    traits::MarketplaceError,
};

/// Read-only access to orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, MarketplaceError>;

    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, MarketplaceError>;

    /// Fetches all orders matching the filter, newest first. An empty filter returns every order.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError>;

    /// The status audit trail for the order, in the order the changes happened.
    async fn fetch_status_history(&self, order_id: OrderId) -> Result<Vec<OrderStatusEntry>, MarketplaceError>;
}
