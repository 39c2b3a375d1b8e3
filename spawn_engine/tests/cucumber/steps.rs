use chrono::{Duration, Utc};
use cucumber::{then, when};
use spawn_common::Kobo;
use spawn_engine::{
    db_types::{ItemStatus, TrackingStatus},
    order_objects::{MeetingRequest, PurchaseClaim},
    payment_objects::PaymentStatus,
    CatalogManagement,
    OrderManagement,
};

use crate::cucumber::{escrow_world::error_kind, EscrowWorld};

#[when(expr = "'{word}' pays {int} naira for {int} of '{word}' with reference '{word}'")]
async fn pay_for_item(world: &mut EscrowWorld, buyer: String, amount: i64, quantity: i64, title: String, reference: String) {
    world.system().gateway.add_successful_payment(&reference, Kobo::from_naira(amount));
    let claim = PurchaseClaim::new(&reference, world.item(&title).id, world.user(&buyer).id).with_quantity(quantity);
    let result = world.api().verify_and_create_order(claim).await;
    world.record(result);
}

#[when(expr = "'{word}' claims reference '{word}' for '{word}' but the payment was {word}")]
async fn unsuccessful_payment(world: &mut EscrowWorld, buyer: String, reference: String, title: String, status: String) {
    let status: PaymentStatus = serde_json::from_value(serde_json::Value::String(status)).expect("Unknown status");
    let amount = world.item(&title).price;
    world.system().gateway.add_payment(&reference, status, amount, serde_json::Value::Null);
    let claim = PurchaseClaim::new(&reference, world.item(&title).id, world.user(&buyer).id);
    let result = world.api().verify_and_create_order(claim).await;
    world.record(result);
}

#[when(expr = "'{word}' and '{word}' race to buy '{word}' with references '{word}' and '{word}'")]
async fn race_for_item(world: &mut EscrowWorld, first: String, second: String, title: String, ref1: String, ref2: String) {
    let item = world.item(&title).clone();
    let gateway = &world.system().gateway;
    gateway.add_successful_payment(&ref1, item.price);
    gateway.add_successful_payment(&ref2, item.price);
    let claim1 = PurchaseClaim::new(&ref1, item.id, world.user(&first).id);
    let claim2 = PurchaseClaim::new(&ref2, item.id, world.user(&second).id);
    let api = world.api();
    let (r1, r2) = tokio::join!(api.verify_and_create_order(claim1), api.verify_and_create_order(claim2));
    world.race_results = vec![(ref1.clone(), r1.clone()), (ref2.clone(), r2.clone())];
    for (reference, result) in [(ref1, r1), (ref2, r2)] {
        if let Ok(order) = result {
            world.orders.insert(reference, order);
        }
    }
}

#[when(expr = "'{word}' schedules a meeting for order '{word}' at {string}")]
async fn schedule_meeting(world: &mut EscrowWorld, user: String, reference: String, location: String) {
    let meeting = MeetingRequest { location, time: Utc::now() + Duration::days(1) };
    let order_id = world.order(&reference).id;
    let result = world.api().schedule_meeting(order_id, world.user(&user).id, meeting).await;
    world.record(result);
}

#[when(expr = "'{word}' releases the funds for order '{word}'")]
async fn release_funds(world: &mut EscrowWorld, user: String, reference: String) {
    let order_id = world.order(&reference).id;
    let result = world.api().release_funds(order_id, world.user(&user).id).await;
    world.record(result);
}

#[when(expr = "'{word}' retracts the funds for order '{word}' because {string}")]
async fn retract_funds(world: &mut EscrowWorld, user: String, reference: String, reason: String) {
    let order_id = world.order(&reference).id;
    let result = world.api().retract_funds(order_id, world.user(&user).id, &reason).await;
    world.record(result);
}

#[when(expr = "'{word}' rates order '{word}' with {int} stars")]
async fn rate_seller(world: &mut EscrowWorld, user: String, reference: String, stars: i64) {
    let order_id = world.order(&reference).id;
    let result = world.api().rate_seller(order_id, world.user(&user).id, stars).await;
    world.record(result.map(|rated| rated.order));
}

#[then(expr = "order '{word}' is '{word}' with legacy status '{word}'")]
async fn check_order_status(world: &mut EscrowWorld, reference: String, tracking: String, legacy: String) {
    let order = world
        .system()
        .db
        .fetch_order_by_payment_reference(&reference)
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("No order for payment {reference}"));
    let tracking = tracking.parse::<TrackingStatus>().expect("Unknown tracking status");
    assert_eq!(order.tracking_status, tracking);
    assert_eq!(order.status().to_string(), legacy);
}

#[then(expr = "order '{word}' has a total price of {int} naira")]
async fn check_order_price(world: &mut EscrowWorld, reference: String, price: i64) {
    assert_eq!(world.order(&reference).price, Kobo::from_naira(price));
}

#[then(expr = "order '{word}' has status history {string}")]
async fn check_history(world: &mut EscrowWorld, reference: String, expected: String) {
    let order_id = world.order(&reference).id;
    let history = world.system().db.fetch_status_history(order_id).await.expect("Error fetching history");
    let history = history.iter().map(|h| h.status.to_string()).collect::<Vec<_>>().join(", ");
    assert_eq!(history, expected);
}

#[then(expr = "there is no order for reference '{word}'")]
async fn check_no_order(world: &mut EscrowWorld, reference: String) {
    let order = world.system().db.fetch_order_by_payment_reference(&reference).await.expect("Error fetching order");
    assert!(order.is_none(), "Order exists for {reference}: {order:?}");
}

#[then(expr = "listing '{word}' has {int} in stock and is '{word}'")]
async fn check_stock(world: &mut EscrowWorld, title: String, quantity: i64, status: String) {
    let item_id = world.item(&title).id;
    let item = world.system().db.fetch_item(item_id).await.expect("Error fetching item").expect("Item is gone");
    assert_eq!(item.quantity, quantity);
    let status = match status.as_str() {
        "available" => ItemStatus::Available,
        "sold" => ItemStatus::Sold,
        s => panic!("Unknown item status {s}"),
    };
    assert_eq!(item.status, status);
}

#[then(expr = "seller '{word}' has a rating of {float} from {int} rating(s)")]
async fn check_rating(world: &mut EscrowWorld, name: String, average: f64, count: i64) {
    let seller_id = world.user(&name).id;
    let seller = world.system().db.fetch_user(seller_id).await.expect("Error fetching user").expect("User is gone");
    assert_eq!(seller.rating_count, count);
    assert!((seller.rating - average).abs() < 1e-9, "Expected rating {average}, got {}", seller.rating);
}

#[then(expr = "the request fails with '{word}'")]
async fn check_failure(world: &mut EscrowWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    assert_eq!(error_kind(err), kind, "Unexpected error: {err}");
}

#[then("the request succeeds")]
async fn check_success(world: &mut EscrowWorld) {
    assert!(world.last_error.is_none(), "The last request failed: {:?}", world.last_error);
}

#[then(expr = "exactly one purchase succeeds and the other fails with '{word}'")]
async fn check_race(world: &mut EscrowWorld, kind: String) {
    let winners = world.race_results.iter().filter(|(_, r)| r.is_ok()).count();
    assert_eq!(winners, 1, "Race results: {:?}", world.race_results);
    let (_, loser) = world.race_results.iter().find(|(_, r)| r.is_err()).expect("No losing purchase");
    let err = loser.as_ref().expect_err("Losing purchase succeeded");
    assert_eq!(error_kind(err), kind);
}
