use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Item, ItemId, NewItem, UserId},
    traits::MarketplaceError,
};

const ITEM_COLUMNS: &str = "id, title, price, location, seller_id, quantity, status, created_at, updated_at";

pub async fn fetch_item(item_id: ItemId, conn: &mut SqliteConnection) -> Result<Option<Item>, MarketplaceError> {
    let item = sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
        .bind(item_id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

pub async fn insert_item(item: NewItem, conn: &mut SqliteConnection) -> Result<Item, MarketplaceError> {
    if item.quantity < 0 {
        return Err(MarketplaceError::InvalidValue(format!("Item quantity cannot be negative: {}", item.quantity)));
    }
    let item = sqlx::query_as::<_, Item>(&format!(
        r#"
            INSERT INTO items (title, price, location, seller_id, quantity, status)
            VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 > 0 THEN 'available' ELSE 'sold' END)
            RETURNING {ITEM_COLUMNS};
        "#
    ))
    .bind(item.title)
    .bind(item.price)
    .bind(item.location)
    .bind(item.seller_id)
    .bind(item.quantity)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Item {} '{}' listed with {} units", item.id, item.title, item.quantity);
    Ok(item)
}

/// Removes `quantity` units from the item's stock, in a single conditional statement.
///
/// The stock is only touched if there is enough of it, and if `buyer` is not the seller. If either condition fails,
/// `None` is returned and nothing is written. Use [`explain_failed_reservation`] to find out why.
pub async fn reserve_stock(
    item_id: ItemId,
    buyer: UserId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Item>, MarketplaceError> {
    let item = sqlx::query_as::<_, Item>(&format!(
        r#"
            UPDATE items SET
                quantity = quantity - $1,
                status = CASE WHEN quantity - $1 > 0 THEN 'available' ELSE 'sold' END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND quantity >= $1 AND seller_id <> $3
            RETURNING {ITEM_COLUMNS};
        "#
    ))
    .bind(quantity)
    .bind(item_id)
    .bind(buyer)
    .fetch_optional(conn)
    .await?;
    if let Some(item) = &item {
        trace!("🗃️ Reserved {quantity} units of item {item_id}. {} remain", item.quantity);
    }
    Ok(item)
}

/// Works out why [`reserve_stock`] refused to reserve the requested quantity.
pub async fn explain_failed_reservation(
    item_id: ItemId,
    buyer: UserId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<MarketplaceError, MarketplaceError> {
    let err = match fetch_item(item_id, conn).await? {
        None => MarketplaceError::ItemNotFound(item_id),
        Some(item) if item.seller_id == buyer => MarketplaceError::CannotBuyOwnItem,
        Some(item) => MarketplaceError::InventoryExhausted { item_id, requested: quantity, available: item.quantity },
    };
    Ok(err)
}

/// Returns `quantity` units to the item's stock. The item is available for sale again afterwards.
pub async fn restore_stock(
    item_id: ItemId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Item, MarketplaceError> {
    let item = sqlx::query_as::<_, Item>(&format!(
        r#"
            UPDATE items SET
                quantity = quantity + $1,
                status = 'available',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING {ITEM_COLUMNS};
        "#
    ))
    .bind(quantity)
    .bind(item_id)
    .fetch_optional(conn)
    .await?
    .ok_or(MarketplaceError::ItemNotFound(item_id))?;
    trace!("🗃️ Restored {quantity} units of item {item_id}. {} available", item.quantity);
    Ok(item)
}
