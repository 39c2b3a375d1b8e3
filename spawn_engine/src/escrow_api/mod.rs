//! # Spawn escrow engine public API
//!
//! The `escrow_api` module exposes the programmatic API for the escrow engine.
//!
//! * [`order_flow_api`] is the primary API. It turns verified payments into orders, and moves orders through the
//!   meeting, release, refund and rating steps.
//! * [`order_objects`] and [`payment_objects`] hold the request and response types used by the API.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend and a payment gateway that implement the traits in
//! [`crate::traits`].
//!
//! ```rust,ignore
//! use spawn_engine::{events::EventProducers, OrderFlowApi, PurchaseClaim, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/spawn_market.db", 25).await?;
//! let api = OrderFlowApi::new(db, my_gateway, EventProducers::default());
//! let claim = PurchaseClaim::new("T123456", item_id, buyer_id).with_quantity(2);
//! let order = api.verify_and_create_order(claim).await?;
//! ```

pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
