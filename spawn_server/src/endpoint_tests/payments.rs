use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;
use spawn_common::Kobo;
use spawn_engine::{
    payment_objects::{PaymentInitialization, PaymentStatus},
    CatalogManagement,
    OrderManagement,
};

use super::{
    helpers::{setup, verified, TestContext, FRONTEND_URL},
    mocks::MockGateway,
};

fn checkout_gateway(ctx: &TestContext, reference: &'static str, status: PaymentStatus) -> MockGateway {
    let metadata = json!({ "buyer_id": ctx.buyer.id, "item_id": ctx.lamp.id, "quantity": 1 });
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().withf(move |r| r == reference).times(1).returning(move |r| {
        let mut v = verified(r, status, Kobo::from_naira(500));
        v.metadata = metadata.clone();
        Ok(v)
    });
    gateway
}

#[actix_web::test]
async fn callback_creates_the_order_and_redirects_to_it() {
    let ctx = setup().await;
    let gateway = checkout_gateway(&ctx, "T700", PaymentStatus::Success);
    let req = TestRequest::get().uri("/api/payment/paystack/callback?reference=T700&trxref=T700");
    let res = ctx.send(gateway, "", req).await;
    assert_eq!(res.status, StatusCode::FOUND);
    let order = ctx.db.fetch_order_by_payment_reference("T700").await.unwrap().expect("Order was not created");
    assert_eq!(order.buyer_id, ctx.buyer.id);
    let expected = format!("{FRONTEND_URL}/declutter/purchase/{}", order.id.value());
    assert_eq!(res.location.as_deref(), Some(expected.as_str()));

    // Paystack may call back again. The gateway is not consulted a second time.
    let req = TestRequest::get().uri("/api/payment/paystack/callback?trxref=T700");
    let res = ctx.send(MockGateway::new(), "", req).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some(expected.as_str()));
    let lamp = ctx.db.fetch_item(ctx.lamp.id).await.unwrap().unwrap();
    assert_eq!(lamp.quantity, 1);
}

#[actix_web::test]
async fn abandoned_checkouts_redirect_to_the_failure_page() {
    let ctx = setup().await;
    let gateway = checkout_gateway(&ctx, "T701", PaymentStatus::Abandoned);
    let req = TestRequest::get().uri("/api/payment/paystack/callback?reference=T701");
    let res = ctx.send(gateway, "", req).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some(format!("{FRONTEND_URL}/payment-failure").as_str()));
    assert!(ctx.db.fetch_order_by_payment_reference("T701").await.unwrap().is_none());
}

#[actix_web::test]
async fn callback_without_a_reference() {
    let ctx = setup().await;
    let res = ctx.send(MockGateway::new(), "", TestRequest::get().uri("/api/payment/paystack/callback")).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some(format!("{FRONTEND_URL}/payment-failure").as_str()));
}

#[actix_web::test]
async fn initialize_payment_prices_the_checkout() {
    let ctx = setup().await;
    let buyer = ctx.buyer.id;
    let lamp = ctx.lamp.id;
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize_payment()
        .withf(move |req| {
            req.amount == Kobo::from_naira(1000)
                && req.email == "ada@example.com"
                && req.metadata.buyer_id == buyer
                && req.metadata.item_id == lamp
                && req.metadata.quantity == 2
        })
        .times(1)
        .returning(|_| {
            Ok(PaymentInitialization {
                authorization_url: "https://checkout.paystack.com/abc123".to_string(),
                access_code: "abc123".to_string(),
                reference: "T800".to_string(),
            })
        });
    let req = TestRequest::post()
        .uri("/api/payment/paystack/initialize")
        .set_json(json!({ "itemId": lamp.value(), "quantity": 2, "email": "ada@example.com" }));
    let res = ctx.send(gateway, &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({
            "authorizationUrl": "https://checkout.paystack.com/abc123",
            "accessCode": "abc123",
            "reference": "T800"
        })
    );
}

#[actix_web::test]
async fn initialize_payment_checks_the_listing() {
    let ctx = setup().await;
    let body = json!({ "itemId": ctx.lamp.id.value(), "email": "chidi@example.com" });
    let req = TestRequest::post().uri("/api/payment/paystack/initialize").set_json(body);
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.seller), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let body = json!({ "itemId": ctx.lamp.id.value(), "quantity": 3, "email": "ada@example.com" });
    let req = TestRequest::post().uri("/api/payment/paystack/initialize").set_json(body);
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let req = TestRequest::post().uri("/api/payment/paystack/initialize").set_json(json!({ "itemId": 1 }));
    let res = ctx.send(MockGateway::new(), "", req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
