use crate::{
    db_types::{Item, ItemId, NewItem, NewUser, User, UserId},
    traits::MarketplaceError,
};

/// Access to the items and users that the listing and account services own.
///
/// The engine only ever reads these records, apart from item quantities (see
/// [`MarketplaceDatabase`](crate::traits::MarketplaceDatabase)) and seller ratings. The insert methods exist so that
/// the records can be seeded by the owning services and by tests.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_item(&self, item_id: ItemId) -> Result<Option<Item>, MarketplaceError>;

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, MarketplaceError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError>;

    async fn insert_item(&self, item: NewItem) -> Result<Item, MarketplaceError>;
}
