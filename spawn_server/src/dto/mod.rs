//! The JSON shapes the storefront expects. Field names are camelCase, and orders carry both the detailed
//! `trackingStatus` and the coarse legacy `status`.
mod orders;

pub use orders::{
    ItemSummary,
    OrderDetailsResponse,
    OrderResponse,
    PartySummary,
    PaymentInitializationResponse,
    RatedOrderResponse,
    StatusEntryResponse,
    VerifiedPaymentResponse,
};
