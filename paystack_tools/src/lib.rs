//! A thin client for the parts of the Paystack REST API that the marketplace uses: verifying and initializing
//! transactions, refunding them, and paying sellers out.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    InitializeTransaction,
    PaystackResponse,
    PaystackTransaction,
    Refund,
    RefundRequest,
    Transfer,
    TransferRequest,
    TransactionAuthorization,
};
pub use error::PaystackApiError;
