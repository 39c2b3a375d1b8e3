//! Spawn Escrow Engine
//!
//! The escrow engine tracks marketplace purchases from the moment a payment is verified until the money reaches the
//! seller (or goes back to the buyer). This library contains the core logic. It is independent of the HTTP layer and
//! of any particular payment provider.
//!
//! The library is divided into the following sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the `db_types` module and are public.
//! 2. The backend contracts ([`mod@traits`]). A storage backend and a payment provider implement these in order to
//!    drive the engine.
//! 3. The engine's public API ([`mod@escrow_api`]), which owns the order lifecycle:
//!    `paid → meeting_scheduled → completed`, or `meeting_scheduled → refund_requested → refunded`.
//!
//! The engine also emits events once changes are committed: `OrderCreated`, `FundsReleased` and `OrderRefunded`. A
//! simple hook framework ([`mod@events`]) lets the server send emails, pay sellers out and refund buyers in response.
mod db;

pub mod db_types;
pub mod events;
pub mod rating;
pub mod traits;

mod escrow_api;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db::SqliteDatabase, run_migrations};
pub use escrow_api::{
    errors::OrderFlowError,
    order_flow_api::{OrderFlowApi, OrderFlowOptions, DEFAULT_VERIFY_TIMEOUT},
    order_objects,
    payment_objects,
};
pub use traits::{
    CatalogManagement,
    CreatedOrder,
    MarketplaceDatabase,
    MarketplaceError,
    OrderManagement,
    PaymentGateway,
    PaymentGatewayError,
    RatedOrder,
};
