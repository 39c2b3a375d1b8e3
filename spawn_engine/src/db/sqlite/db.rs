use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{db_url, items, new_pool, orders, orders::OrderRecord, run_migrations, users};
use crate::{
    db_types::{
        Item,
        ItemId,
        MeetingDetails,
        NewItem,
        NewOrder,
        NewUser,
        Order,
        OrderAction,
        OrderId,
        OrderStatusEntry,
        OrderUpdate,
        TrackingStatus,
        User,
        UserId,
    },
    escrow_api::order_objects::OrderQueryFilter,
    rating::{SellerRating, StarRating},
    traits::{CatalogManagement, CreatedOrder, MarketplaceDatabase, MarketplaceError, OrderManagement, RatedOrder},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SPAWN_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, MarketplaceError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, MarketplaceError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MarketplaceError> {
        run_migrations(&self.pool).await.map_err(|e| MarketplaceError::DatabaseError(e.to_string()))
    }

    /// Returns a reference to the database connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs a buyer-driven transition that touches nothing but the order row.
    async fn transition(
        &self,
        order_id: OrderId,
        buyer: UserId,
        action: OrderAction,
        update: OrderUpdate,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::guarded_update(order_id, buyer, action.required_status(), update, &mut tx).await?;
        match updated {
            Some(order) => {
                tx.commit().await?;
                debug!("🗃️ Order {order_id} is now {}", order.tracking_status);
                Ok(order)
            },
            None => {
                let err = orders::explain_rejected_action(order_id, buyer, action, &mut tx).await?;
                tx.rollback().await?;
                debug!("🗃️ Could not {action} on order {order_id}: {err}");
                Err(err)
            },
        }
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order_for_item(&self, order: NewOrder) -> Result<CreatedOrder, MarketplaceError> {
        if order.quantity < 1 {
            return Err(MarketplaceError::InvalidValue(format!("Order quantity must be positive: {}", order.quantity)));
        }
        let mut tx = self.pool.begin().await?;
        // The reservation must be the first statement so that the transaction holds the write lock from the start.
        let item = match items::reserve_stock(order.item_id, order.buyer_id, order.quantity, &mut tx).await? {
            Some(item) => item,
            None => {
                let err = items::explain_failed_reservation(order.item_id, order.buyer_id, order.quantity, &mut tx)
                    .await?;
                tx.rollback().await?;
                debug!("🗃️ Could not reserve stock for payment {}: {err}", order.payment_reference);
                return Err(err);
            },
        };
        let total = item.price.checked_mul(order.quantity).ok_or_else(|| {
            MarketplaceError::InvalidValue(format!("{} × {} overflows", item.price, order.quantity))
        })?;
        if let Some(paid) = order.paid_amount {
            if paid < total {
                tx.rollback().await?;
                return Err(MarketplaceError::PaymentShortfall { expected: total, paid });
            }
        }
        let Some(buyer) = users::fetch_user(order.buyer_id, &mut tx).await? else {
            tx.rollback().await?;
            return Err(MarketplaceError::UserNotFound(order.buyer_id));
        };
        let Some(seller) = users::fetch_user(item.seller_id, &mut tx).await? else {
            tx.rollback().await?;
            return Err(MarketplaceError::UserNotFound(item.seller_id));
        };
        let record = OrderRecord {
            buyer_id: order.buyer_id,
            seller_id: item.seller_id,
            item_id: item.id,
            quantity: order.quantity,
            price: total,
            payment_reference: &order.payment_reference,
        };
        let new_order = match orders::insert_order(record, &mut tx).await {
            Ok(o) => o,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            },
        };
        tx.commit().await?;
        info!(
            "🗃️ Order {} created for {} × item {} ({}). {} units left.",
            new_order.id, new_order.quantity, item.id, new_order.price, item.quantity
        );
        Ok(CreatedOrder { order: new_order, item, buyer, seller })
    }

    async fn schedule_meeting(
        &self,
        order_id: OrderId,
        buyer: UserId,
        meeting: MeetingDetails,
    ) -> Result<Order, MarketplaceError> {
        let update = OrderUpdate::default().with_status(TrackingStatus::MeetingScheduled).with_meeting(meeting);
        self.transition(order_id, buyer, OrderAction::ScheduleMeeting, update).await
    }

    async fn release_funds(&self, order_id: OrderId, buyer: UserId) -> Result<Order, MarketplaceError> {
        let update = OrderUpdate::default().with_status(TrackingStatus::Completed);
        self.transition(order_id, buyer, OrderAction::ReleaseFunds, update).await
    }

    async fn retract_funds(&self, order_id: OrderId, buyer: UserId, reason: &str) -> Result<Order, MarketplaceError> {
        let action = OrderAction::RetractFunds;
        let mut tx = self.pool.begin().await?;
        let update = OrderUpdate::default().with_status(TrackingStatus::RefundRequested).with_refund_reason(reason);
        let requested = orders::guarded_update(order_id, buyer, action.required_status(), update, &mut tx).await?;
        let Some(requested) = requested else {
            let err = orders::explain_rejected_action(order_id, buyer, action, &mut tx).await?;
            tx.rollback().await?;
            debug!("🗃️ Could not {action} on order {order_id}: {err}");
            return Err(err);
        };
        let item = items::restore_stock(requested.item_id, requested.quantity, &mut tx).await?;
        let update = OrderUpdate::default().with_status(TrackingStatus::Refunded);
        let refunded = orders::guarded_update(order_id, buyer, TrackingStatus::RefundRequested, update, &mut tx)
            .await?
            .ok_or(MarketplaceError::ConcurrentModification)?;
        tx.commit().await?;
        info!(
            "🗃️ Order {order_id} refunded. {} units of item {} returned to stock ({} available)",
            refunded.quantity, item.id, item.quantity
        );
        Ok(refunded)
    }

    async fn rate_seller(
        &self,
        order_id: OrderId,
        buyer: UserId,
        rating: StarRating,
    ) -> Result<RatedOrder, MarketplaceError> {
        let action = OrderAction::RateSeller;
        let mut tx = self.pool.begin().await?;
        let update = OrderUpdate::default().with_seller_rating(i64::from(rating.value()));
        let rated = orders::guarded_update(order_id, buyer, action.required_status(), update, &mut tx).await?;
        let Some(order) = rated else {
            let err = orders::explain_rejected_action(order_id, buyer, action, &mut tx).await?;
            tx.rollback().await?;
            debug!("🗃️ Could not {action} on order {order_id}: {err}");
            return Err(err);
        };
        let seller = users::fetch_user(order.seller_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::UserNotFound(order.seller_id))?;
        let previous = SellerRating::new(seller.rating, seller.rating_count);
        let next = previous.fold(rating);
        if !users::compare_and_set_rating(seller.id, previous, next, &mut tx).await? {
            tx.rollback().await?;
            warn!("🗃️ Seller {} was rated by someone else while rating order {order_id}", seller.id);
            return Err(MarketplaceError::ConcurrentModification);
        }
        tx.commit().await?;
        info!("🗃️ Order {order_id} rated {rating}. Seller {} is now rated {next}", seller.id);
        Ok(RatedOrder { order, seller_rating: next })
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_payment_reference(reference, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(query, &mut conn).await
    }

    async fn fetch_status_history(&self, order_id: OrderId) -> Result<Vec<OrderStatusEntry>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_status_history(order_id, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_item(&self, item_id: ItemId) -> Result<Option<Item>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        items::fetch_item(item_id, &mut conn).await
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let item = items::insert_item(item, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }
}
