use log::{debug, trace};
use spawn_common::Kobo;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{
        ItemId,
        Order,
        OrderAction,
        OrderId,
        OrderStatusEntry,
        OrderUpdate,
        TrackingStatus,
        UserId,
    },
    escrow_api::order_objects::OrderQueryFilter,
    traits::MarketplaceError,
};

const ORDER_COLUMNS: &str = "id, buyer_id, seller_id, item_id, quantity, price, payment_reference, tracking_status, \
                             meeting_location, meeting_time, refund_reason, seller_rating, created_at, updated_at";

/// The fields of an order that are fixed when the order is created.
pub struct OrderRecord<'a> {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub price: Kobo,
    pub payment_reference: &'a str,
}

/// Inserts a new order in the `paid` state using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The status history entry is written by a database trigger.
pub async fn insert_order(record: OrderRecord<'_>, conn: &mut SqliteConnection) -> Result<Order, MarketplaceError> {
    let result = sqlx::query_as::<_, Order>(&format!(
        r#"
            INSERT INTO orders (buyer_id, seller_id, item_id, quantity, price, payment_reference, tracking_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS};
        "#
    ))
    .bind(record.buyer_id)
    .bind(record.seller_id)
    .bind(record.item_id)
    .bind(record.quantity)
    .bind(record.price)
    .bind(record.payment_reference)
    .bind(TrackingStatus::Paid)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("🗃️ Order {} for {} has been saved in the DB", order.id, order.price);
            Ok(order)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(MarketplaceError::DuplicatePaymentReference(record.payment_reference.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, MarketplaceError> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketplaceError> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1"))
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in descending order, newest first
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, MarketplaceError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer);
    }
    if let Some(seller) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller);
    }
    if let Some(item) = query.item_id {
        where_clause.push("item_id = ");
        where_clause.push_bind_unseparated(item);
    }
    if !query.statuses.is_empty() {
        where_clause.push("tracking_status IN (");
        for (i, status) in query.statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {:?}", orders.len());
    Ok(orders)
}

pub async fn fetch_status_history(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusEntry>, MarketplaceError> {
    let history = sqlx::query_as::<_, OrderStatusEntry>(
        "SELECT order_id, status, created_at FROM order_status_history WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(history)
}

/// Applies `update` to the order, but only if `buyer` is the order's buyer and the order is currently in `from`.
/// Setting a seller rating additionally requires that the order has not been rated yet.
///
/// This is a single conditional statement. It returns `None` if the guard failed, in which case nothing was written.
pub async fn guarded_update(
    order_id: OrderId,
    buyer: UserId,
    from: TrackingStatus,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketplaceError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for order {order_id}. Update request skipped.");
        return fetch_order(order_id, conn).await;
    }
    let guard_rating = update.seller_rating.is_some();
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = update.tracking_status {
        set_clause.push("tracking_status = ");
        set_clause.push_bind_unseparated(status);
    }
    if let Some(meeting) = update.meeting_details {
        set_clause.push("meeting_location = ");
        set_clause.push_bind_unseparated(meeting.location);
        set_clause.push("meeting_time = ");
        set_clause.push_bind_unseparated(meeting.time);
    }
    if let Some(reason) = update.refund_reason {
        set_clause.push("refund_reason = ");
        set_clause.push_bind_unseparated(reason);
    }
    if let Some(rating) = update.seller_rating {
        set_clause.push("seller_rating = ");
        set_clause.push_bind_unseparated(rating);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(order_id);
    builder.push(" AND buyer_id = ");
    builder.push_bind(buyer);
    builder.push(" AND tracking_status = ");
    builder.push_bind(from);
    if guard_rating {
        builder.push(" AND seller_rating IS NULL");
    }
    builder.push(format!(" RETURNING {ORDER_COLUMNS}"));
    trace!("🗃️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    trace!("🗃️ Order {order_id} updated: {}", order.is_some());
    Ok(order)
}

/// Works out why a [`guarded_update`] for `action` did not match the order.
pub async fn explain_rejected_action(
    order_id: OrderId,
    user: UserId,
    action: OrderAction,
    conn: &mut SqliteConnection,
) -> Result<MarketplaceError, MarketplaceError> {
    let order = match fetch_order(order_id, conn).await? {
        None => return Ok(MarketplaceError::OrderNotFound(order_id)),
        Some(o) => o,
    };
    let err = if order.buyer_id != user {
        MarketplaceError::NotOrderBuyer { order_id, user }
    } else if action == OrderAction::RateSeller &&
        order.tracking_status == TrackingStatus::Completed &&
        order.seller_rating.is_some()
    {
        MarketplaceError::AlreadyRated(order_id)
    } else {
        MarketplaceError::InvalidTransition { order_id, status: order.tracking_status, action }
    };
    Ok(err)
}
