use std::collections::HashMap;

use cucumber::World;
use spawn_engine::{
    db_types::{Item, Order, User},
    events::EventProducers,
    MarketplaceDatabase,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};

use crate::support::{fake_gateway::FakeGateway, prepare_env::prepare_test_env};

#[derive(Default, Debug, World)]
pub struct EscrowWorld {
    pub system: Option<EscrowSystem>,
    pub users: HashMap<String, User>,
    pub items: HashMap<String, Item>,
    /// Orders, keyed by payment reference
    pub orders: HashMap<String, Order>,
    pub last_error: Option<OrderFlowError>,
    pub race_results: Vec<(String, Result<Order, OrderFlowError>)>,
}

#[derive(Debug)]
pub struct EscrowSystem {
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub api: OrderFlowApi<SqliteDatabase, FakeGateway>,
}

impl EscrowSystem {
    pub async fn new() -> Self {
        let db = prepare_test_env(5).await;
        let gateway = FakeGateway::default();
        let api = OrderFlowApi::new(db.clone(), gateway.clone(), EventProducers::default());
        Self { db, gateway, api }
    }

    pub fn db_url(&self) -> String {
        self.db.url().to_string()
    }
}

impl EscrowWorld {
    pub fn system(&self) -> &EscrowSystem {
        self.system.as_ref().expect("Escrow system not initialised")
    }

    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase, FakeGateway> {
        &self.system().api
    }

    pub fn user(&self, name: &str) -> &User {
        self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn item(&self, title: &str) -> &Item {
        self.items.get(title).unwrap_or_else(|| panic!("No listing called {title}"))
    }

    pub fn order(&self, reference: &str) -> &Order {
        self.orders.get(reference).unwrap_or_else(|| panic!("No order for payment {reference}"))
    }

    /// Records the outcome of a request. Successful requests clear the last error.
    pub fn record(&mut self, result: Result<Order, OrderFlowError>) {
        match result {
            Ok(order) => {
                self.last_error = None;
                self.orders.insert(order.payment_reference.clone(), order);
            },
            Err(e) => self.last_error = Some(e),
        }
    }
}

pub fn error_kind(e: &OrderFlowError) -> &'static str {
    match e {
        OrderFlowError::NotFound(_) => "NotFound",
        OrderFlowError::Unauthorized(_) => "Unauthorized",
        OrderFlowError::InvalidState(_) => "InvalidState",
        OrderFlowError::ValidationError(_) => "ValidationError",
        OrderFlowError::InventoryExhausted(_) => "InventoryExhausted",
        OrderFlowError::PaymentNotVerified(_) => "PaymentNotVerified",
        OrderFlowError::DependencyFailure(_) => "DependencyFailure",
        OrderFlowError::DatabaseError(_) => "DatabaseError",
    }
}
