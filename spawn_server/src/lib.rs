//! # Spawn server
//! This module hosts the HTTP server for the Spawn marketplace escrow. It is responsible for:
//! Authenticating buyers and sellers with their access tokens.
//! Verifying Paystack payments and turning them into orders.
//! Letting buyers move their orders through the escrow lifecycle, and rate sellers once an order completes.
//! Sending confirmation emails, paying sellers out and refunding buyers in response to engine events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/purchases/...`: The escrow lifecycle. All of these routes require an access token.
//! * `/api/payment/paystack/initialize`: Starts a Paystack checkout.
//! * `/api/payment/paystack/callback`: Where Paystack sends the buyer after checkout.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod dto;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
