use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;
use spawn_common::Kobo;
use spawn_engine::{payment_objects::PaymentStatus, CatalogManagement, PaymentGatewayError};

use super::{
    helpers::{setup, verified},
    mocks::MockGateway,
};

fn verify_body(reference: &str, item_id: i64, quantity: i64) -> serde_json::Value {
    json!({ "reference": reference, "itemId": item_id, "quantity": quantity })
}

#[actix_web::test]
async fn verify_payment_requires_a_token() {
    let ctx = setup().await;
    let req = TestRequest::post().uri("/api/purchases/verify-payment").set_json(verify_body("T1", ctx.lamp.id.value(), 1));
    let res = ctx.send(MockGateway::new(), "", req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Authentication Error. No access token was provided.");
}

#[actix_web::test]
async fn verify_payment_rejects_forged_tokens() {
    let ctx = setup().await;
    let mut token = ctx.token(&ctx.buyer);
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let req = TestRequest::post().uri("/api/purchases/verify-payment").set_json(verify_body("T1", ctx.lamp.id.value(), 1));
    let res = ctx.send(MockGateway::new(), &token, req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn verify_payment_creates_an_order() {
    let ctx = setup().await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_payment()
        .withf(|reference| reference == "T100")
        .times(1)
        .returning(|r| Ok(verified(r, PaymentStatus::Success, Kobo::from_naira(1000))));
    let req =
        TestRequest::post().uri("/api/purchases/verify-payment").set_json(verify_body("T100", ctx.lamp.id.value(), 2));
    let res = ctx.send(gateway, &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["success"], true);
    let order_id = body["order"]["id"].as_i64().unwrap();
    assert_eq!(body["redirectUrl"], format!("/declutter/purchase/{order_id}"));
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["order"]["trackingStatus"], "paid");
    assert_eq!(body["order"]["price"], 100_000);
    assert_eq!(body["order"]["quantity"], 2);
    assert_eq!(body["order"]["buyerId"], ctx.buyer.id.value());
    assert_eq!(body["order"]["sellerId"], ctx.seller.id.value());
    let lamp = ctx.db.fetch_item(ctx.lamp.id).await.unwrap().unwrap();
    assert_eq!(lamp.quantity, 0);
}

#[actix_web::test]
async fn failed_payments_do_not_create_orders() {
    let ctx = setup().await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().returning(|r| Ok(verified(r, PaymentStatus::Failed, Kobo::from_naira(500))));
    let req = TestRequest::post().uri("/api/purchases/verify-payment").set_json(verify_body("T101", ctx.lamp.id.value(), 1));
    let res = ctx.send(gateway, &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Payment could not be verified. The payment was failed");
    let lamp = ctx.db.fetch_item(ctx.lamp.id).await.unwrap().unwrap();
    assert_eq!(lamp.quantity, 2);
}

#[actix_web::test]
async fn unreachable_gateway_is_not_a_verified_payment() {
    let ctx = setup().await;
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().returning(|_| Err(PaymentGatewayError::Unreachable("connection reset".into())));
    let req = TestRequest::post().uri("/api/purchases/verify-payment").set_json(verify_body("T102", ctx.lamp.id.value(), 1));
    let res = ctx.send(gateway, &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["success"], false);
}

#[actix_web::test]
async fn malformed_bodies_are_rejected() {
    let ctx = setup().await;
    let req = TestRequest::post().uri("/api/purchases/verify-payment").set_json(json!({ "itemId": 1 }));
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"].as_str().unwrap().starts_with("Could not read request body"));
}

#[actix_web::test]
async fn only_parties_can_see_an_order() {
    let ctx = setup().await;
    let order = ctx.paid_order("T200").await;
    let uri = format!("/api/purchases/{}", order.id.value());
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), TestRequest::get().uri(&uri)).await;
    assert_eq!(res.status, StatusCode::OK);
    let json = res.json();
    assert_eq!(json["paymentReference"], "T200");
    assert_eq!(json["item"]["title"], "Reading lamp");
    assert_eq!(json["counterparty"]["username"], "chidi");
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.seller), TestRequest::get().uri(&uri)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["counterparty"]["username"], "ada");
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.stranger), TestRequest::get().uri(&uri)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), TestRequest::get().uri("/api/purchases/9999")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), TestRequest::get().uri("/api/purchases/lamp")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn purchases_and_sales() {
    let ctx = setup().await;
    let first = ctx.paid_order("T300").await;
    let second = ctx.paid_order("T301").await;
    let req = TestRequest::get().uri("/api/purchases/purchases");
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::OK);
    let purchases = res.json();
    assert_eq!(purchases.as_array().unwrap().len(), 2);
    assert_eq!(purchases[0]["id"], second.id.value());
    assert_eq!(purchases[1]["id"], first.id.value());
    assert_eq!(purchases[0]["item"]["id"], ctx.lamp.id.value());
    assert_eq!(purchases[0]["item"]["status"], "sold");
    assert_eq!(purchases[0]["counterparty"]["username"], "chidi");
    assert_eq!(purchases[0]["counterparty"]["ratingCount"], 0);
    assert!(purchases[0]["counterparty"].get("email").is_none());
    let req = TestRequest::get().uri("/api/purchases/sales");
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.json(), json!([]));
    let req = TestRequest::get().uri("/api/purchases/sales");
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.seller), req).await;
    let sales = res.json();
    assert_eq!(sales[0]["id"], second.id.value());
    assert_eq!(sales[0]["counterparty"]["username"], "ada");
}

#[actix_web::test]
async fn purchases_show_the_sellers_current_rating() {
    let ctx = setup().await;
    let order = ctx.completed_order("T310").await;
    let req = TestRequest::post()
        .uri(&format!("/api/purchases/{}/rate-seller", order.id.value()))
        .set_json(json!({ "rating": 4 }));
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), req).await;
    assert_eq!(res.status, StatusCode::OK);
    let req = TestRequest::get().uri("/api/purchases/purchases");
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.buyer), req).await;
    let seller = &res.json()[0]["counterparty"];
    assert_eq!(seller["rating"], 4.0);
    assert_eq!(seller["ratingCount"], 1);
}

#[actix_web::test]
async fn release_flow() {
    let ctx = setup().await;
    let order = ctx.paid_order("T400").await;
    let base = format!("/api/purchases/{}", order.id.value());
    let buyer = ctx.token(&ctx.buyer);

    // Funds cannot be released before a meeting has been scheduled
    let req = TestRequest::post().uri(&format!("{base}/release-funds"));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let req = TestRequest::post()
        .uri(&format!("{base}/schedule-meeting"))
        .set_json(json!({ "location": "Yaba Market", "time": "2024-06-08T14:00:00Z" }));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["trackingStatus"], "meeting_scheduled");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["meetingDetails"]["location"], "Yaba Market");

    // Only the buyer moves the order along
    let req = TestRequest::post().uri(&format!("{base}/release-funds"));
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.seller), req).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let req = TestRequest::post().uri(&format!("{base}/release-funds"));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["trackingStatus"], "completed");
    assert_eq!(res.json()["status"], "completed");

    let req = TestRequest::get().uri(&format!("{base}/history"));
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.seller), req).await;
    let statuses = res.json().as_array().unwrap().iter().map(|e| e["status"].clone()).collect::<Vec<_>>();
    assert_eq!(statuses, vec![json!("paid"), json!("meeting_scheduled"), json!("completed")]);
}

#[actix_web::test]
async fn retract_flow() {
    let ctx = setup().await;
    let order = ctx.scheduled_order("T500").await;
    let uri = format!("/api/purchases/{}/retract-funds", order.id.value());
    let buyer = ctx.token(&ctx.buyer);

    let req = TestRequest::post().uri(&uri).set_json(json!({}));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri(&uri).set_json(json!({ "reason": "Lamp does not switch on" }));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["trackingStatus"], "refunded");
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["refundReason"], "Lamp does not switch on");
    let lamp = ctx.db.fetch_item(ctx.lamp.id).await.unwrap().unwrap();
    assert_eq!(lamp.quantity, 2);

    let req = TestRequest::post().uri(&uri).set_json(json!({ "reason": "Again" }));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn rate_seller() {
    let ctx = setup().await;
    let order = ctx.completed_order("T600").await;
    let uri = format!("/api/purchases/{}/rate-seller", order.id.value());
    let buyer = ctx.token(&ctx.buyer);

    let req = TestRequest::post().uri(&uri).set_json(json!({ "rating": 0 }));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri(&uri).set_json(json!({ "rating": 5 }));
    let res = ctx.send(MockGateway::new(), &ctx.token(&ctx.stranger), req).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let req = TestRequest::post().uri(&uri).set_json(json!({ "rating": 5 }));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["order"]["sellerRating"], 5);
    assert_eq!(body["sellerRating"]["average"], 5.0);
    assert_eq!(body["sellerRating"]["count"], 1);

    let req = TestRequest::post().uri(&uri).set_json(json!({ "rating": 1 }));
    let res = ctx.send(MockGateway::new(), &buyer, req).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}
