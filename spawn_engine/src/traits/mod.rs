//! # Backend contracts
//!
//! This module defines the behaviour that storage backends and payment providers must expose in order to drive the
//! Spawn escrow engine.
//!
//! * [`MarketplaceDatabase`] is the highest level of behaviour. It owns every write that moves an order through its
//!   lifecycle, and guarantees that each write is atomic and guarded.
//! * [`OrderManagement`] provides read access to orders and their status history.
//! * [`CatalogManagement`] provides access to the items and users the engine collaborates with.
//! * [`PaymentGateway`] is the payment provider. It confirms that a payment reference corresponds to a successful
//!   charge, and moves money back out again for refunds and seller payouts.
mod catalog_management;
mod data_objects;
mod marketplace_database;
mod order_management;
mod payment_gateway;

pub use catalog_management::CatalogManagement;
pub use data_objects::{CreatedOrder, RatedOrder};
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
pub use order_management::OrderManagement;
pub use payment_gateway::{PaymentGateway, PaymentGatewayError};
