use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Item, Order, User},
    rating::SellerRating,
};

/// Everything known about a freshly created order, captured inside the creating transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order: Order,
    /// The item as it stands after the inventory was decremented
    pub item: Item,
    pub buyer: User,
    pub seller: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedOrder {
    pub order: Order,
    pub seller_rating: SellerRating,
}
