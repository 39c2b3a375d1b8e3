use cucumber::given;
use spawn_common::Kobo;

use crate::{
    cucumber::{EscrowSystem, EscrowWorld},
    support::fixtures::{create_listing, create_user},
};

#[given("a fresh install")]
async fn fresh_database(world: &mut EscrowWorld) {
    let system = EscrowSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a buyer '{word}'")]
async fn a_buyer(world: &mut EscrowWorld, name: String) {
    let user = create_user(&world.system().db, &name).await;
    world.users.insert(name, user);
}

#[given(expr = "a seller '{word}' with a listing '{word}' priced at {int} naira and {int} in stock")]
async fn a_seller_with_listing(world: &mut EscrowWorld, name: String, title: String, price: i64, quantity: i64) {
    let db = world.system().db.clone();
    let seller = match world.users.get(&name) {
        Some(u) => u.clone(),
        None => create_user(&db, &name).await,
    };
    let item = create_listing(&db, &seller, &title, Kobo::from_naira(price), quantity).await;
    world.users.insert(name, seller);
    world.items.insert(title, item);
}
