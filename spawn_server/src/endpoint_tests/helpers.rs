use actix_web::{
    body::MessageBody,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use serde_json::Value;
use spawn_common::{Kobo, NAIRA_CURRENCY_CODE};
use spawn_engine::{
    db_types::{Item, NewItem, NewUser, Order, User},
    events::EventProducers,
    order_objects::{MeetingRequest, PurchaseClaim},
    payment_objects::{PaymentStatus, PaymentVerification},
    CatalogManagement,
    OrderFlowApi,
    SqliteDatabase,
};
use tempfile::TempDir;

use super::mocks::MockGateway;
use crate::{
    auth::{SpawnAuthority, AUTH_TOKEN_HEADER},
    config::{AuthConfig, ServerOptions},
    routes::{
        InitializePaymentRoute,
        MyPurchasesRoute,
        MySalesRoute,
        OrderByIdRoute,
        OrderHistoryRoute,
        PaystackCallbackRoute,
        RateSellerRoute,
        ReleaseFundsRoute,
        RetractFundsRoute,
        ScheduleMeetingRoute,
        VerifyPaymentRoute,
    },
    server::{json_config, path_config},
};

pub const FRONTEND_URL: &str = "https://spawn.example.com";

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

/// A fresh marketplace in a throwaway database: buyer `ada`, seller `chidi` and an unrelated user `emeka`.
/// Chidi lists a lamp at ₦500, with 2 in stock.
pub struct TestContext {
    _dir: TempDir,
    pub db: SqliteDatabase,
    pub authority: SpawnAuthority,
    pub buyer: User,
    pub seller: User,
    pub stranger: User,
    pub lamp: Item,
}

pub async fn setup() -> TestContext {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Could not create temp dir");
    let url = format!("sqlite://{}", dir.path().join("spawn_test.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Could not open test database");
    db.migrate().await.expect("Could not migrate test database");
    let buyer = db.insert_user(NewUser::new("ada", "ada@example.com")).await.unwrap();
    let seller =
        db.insert_user(NewUser::new("chidi", "chidi@example.com").with_payout_recipient("RCP_chidi")).await.unwrap();
    let stranger = db.insert_user(NewUser::new("emeka", "emeka@example.com")).await.unwrap();
    let lamp = NewItem {
        title: "Reading lamp".to_string(),
        price: Kobo::from_naira(500),
        location: "Yaba".to_string(),
        seller_id: seller.id,
        quantity: 2,
    };
    let lamp = db.insert_item(lamp).await.unwrap();
    let authority = SpawnAuthority::new(&AuthConfig::new("endpoint-tests-secret-do-not-use-anywhere-else"));
    debug!("🚀️ Test marketplace ready at {url}");
    TestContext { _dir: dir, db, authority, buyer, seller, stranger, lamp }
}

pub fn options() -> ServerOptions {
    ServerOptions { frontend_url: FRONTEND_URL.to_string(), ..Default::default() }
}

pub fn verified(reference: &str, status: PaymentStatus, amount: Kobo) -> PaymentVerification {
    PaymentVerification {
        reference: reference.to_string(),
        status,
        amount,
        currency: NAIRA_CURRENCY_CODE.to_string(),
        metadata: Value::Null,
    }
}

pub fn meeting() -> MeetingRequest {
    MeetingRequest { location: "Yaba Market".to_string(), time: chrono::Utc::now() }
}

impl TestContext {
    pub fn token(&self, user: &User) -> String {
        self.authority.issue_token(user.id, None).expect("Could not issue token")
    }

    pub fn api(&self, gateway: MockGateway) -> OrderFlowApi<SqliteDatabase, MockGateway> {
        OrderFlowApi::new(self.db.clone(), gateway, EventProducers::default())
    }

    /// A `paid` order for one lamp, created without going through payment verification.
    pub async fn paid_order(&self, reference: &str) -> Order {
        let claim = PurchaseClaim::new(reference, self.lamp.id, self.buyer.id);
        self.api(MockGateway::new()).create_order(claim).await.expect("Could not create order")
    }

    pub async fn scheduled_order(&self, reference: &str) -> Order {
        let order = self.paid_order(reference).await;
        let order = self.api(MockGateway::new()).schedule_meeting(order.id, self.buyer.id, meeting()).await.unwrap();
        assert!(order.meeting_details.is_some());
        order
    }

    pub async fn completed_order(&self, reference: &str) -> Order {
        let order = self.scheduled_order(reference).await;
        self.api(MockGateway::new()).release_funds(order.id, self.buyer.id).await.unwrap()
    }

    /// Sends `req` to a test app backed by this marketplace and `gateway`. `token` may be empty.
    pub async fn send(&self, gateway: MockGateway, token: &str, req: TestRequest) -> TestResponse {
        let req = if token.is_empty() { req } else { req.insert_header((AUTH_TOKEN_HEADER, token)) };
        let app = App::new()
            .app_data(web::Data::new(self.api(gateway)))
            .app_data(web::Data::new(self.authority.clone()))
            .app_data(web::Data::new(options()))
            .app_data(json_config())
            .app_data(path_config())
            .configure(configure);
        let service = test::init_service(app).await;
        let res = test::call_service(&service, req.to_request()).await;
        let status = res.status();
        let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
        let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
        debug!("🚀️ {status}: {body}");
        TestResponse { status, location, body }
    }
}

fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(VerifyPaymentRoute::<SqliteDatabase, MockGateway>::new())
            .service(MyPurchasesRoute::<SqliteDatabase, MockGateway>::new())
            .service(MySalesRoute::<SqliteDatabase, MockGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, MockGateway>::new())
            .service(OrderHistoryRoute::<SqliteDatabase, MockGateway>::new())
            .service(ScheduleMeetingRoute::<SqliteDatabase, MockGateway>::new())
            .service(ReleaseFundsRoute::<SqliteDatabase, MockGateway>::new())
            .service(RetractFundsRoute::<SqliteDatabase, MockGateway>::new())
            .service(RateSellerRoute::<SqliteDatabase, MockGateway>::new())
            .service(InitializePaymentRoute::<SqliteDatabase, MockGateway>::new())
            .service(PaystackCallbackRoute::<SqliteDatabase, MockGateway>::new()),
    );
}
