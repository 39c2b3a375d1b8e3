use spawn_common::Kobo;
use spawn_engine::{
    db_types::{Item, NewItem, NewUser, User},
    CatalogManagement,
    SqliteDatabase,
};

pub async fn create_user(db: &SqliteDatabase, name: &str) -> User {
    let user = NewUser::new(name.to_string(), format!("{name}@example.com")).with_payout_recipient(format!("RCP_{name}"));
    db.insert_user(user).await.expect("Error creating user")
}

pub async fn create_listing(db: &SqliteDatabase, seller: &User, title: &str, price: Kobo, quantity: i64) -> Item {
    let item = NewItem {
        title: title.to_string(),
        price,
        location: "Lagos".to_string(),
        seller_id: seller.id,
        quantity,
    };
    db.insert_item(item).await.expect("Error creating item")
}
