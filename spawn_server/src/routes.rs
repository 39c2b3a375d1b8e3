//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, http::header, web, HttpResponse, Responder};
use log::*;
use spawn_engine::{
    db_types::{OrderId, UserId},
    order_objects::{MeetingRequest, OrderDetails, PurchaseClaim},
    MarketplaceDatabase,
    OrderFlowApi,
    PaymentGateway,
};

use crate::{
    auth::JwtClaims,
    config::ServerOptions,
    data_objects::{
        InitializePaymentParams,
        PaymentCallbackQuery,
        RateSellerParams,
        RetractFundsParams,
        VerifyPaymentParams,
    },
    dto::{
        OrderDetailsResponse,
        OrderResponse,
        PaymentInitializationResponse,
        RatedOrderResponse,
        StatusEntryResponse,
        VerifiedPaymentResponse,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Purchases  ----------------------------------------------------

route!(verify_payment => Post "/purchases/verify-payment" impl MarketplaceDatabase, PaymentGateway);
/// Route handler for the verify-payment endpoint
///
/// The storefront calls this once the buyer has completed the Paystack checkout. The payment is verified with
/// Paystack and, if it covers the full price of the purchase, a new `paid` order is created for the caller.
///
/// A payment that cannot be verified results in a 400 with `{"success": false, "message": ...}`.
pub async fn verify_payment<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<VerifyPaymentParams>,
    api: web::Data<OrderFlowApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let buyer = claims.user_id();
    debug!("💻️ POST verify_payment for {} by user {buyer}", params.reference);
    let claim = PurchaseClaim::new(params.reference, params.item_id, buyer).with_quantity(params.quantity);
    let order = api.verify_and_create_order(claim).await.map_err(|e| {
        debug!("💻️ Payment verification failed. {e}");
        e
    })?;
    let response = VerifiedPaymentResponse {
        success: true,
        redirect_url: options.order_path(order.id.value()),
        message: "Payment verified and order created".to_string(),
        order: order.into(),
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(my_purchases => Get "/purchases/purchases" impl MarketplaceDatabase, PaymentGateway);
/// Orders where the caller is the buyer, newest first. Each order carries the item and the seller's rating.
pub async fn my_purchases<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_purchases for user {}", claims.user_id());
    let orders = api.purchase_details(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(into_responses(orders, claims.user_id())))
}

route!(my_sales => Get "/purchases/sales" impl MarketplaceDatabase, PaymentGateway);
/// Orders where the caller is the seller, newest first, with the item and the buyer.
pub async fn my_sales<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_sales for user {}", claims.user_id());
    let orders = api.sale_details(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(into_responses(orders, claims.user_id())))
}

route!(order_by_id => Get "/purchases/{order_id}" impl MarketplaceDatabase, PaymentGateway);
/// Fetch a single order. Only the buyer and the seller may see it; everyone else gets a 403.
pub async fn order_by_id<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id}) for user {}", claims.user_id());
    let details = api.order_details_for_party(order_id, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(OrderDetailsResponse::for_viewer(details, claims.user_id())))
}

route!(order_history => Get "/purchases/{order_id}/history" impl MarketplaceDatabase, PaymentGateway);
pub async fn order_history<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_history({order_id})");
    let history = api.status_history(order_id, claims.user_id()).await?;
    let history = history.into_iter().map(StatusEntryResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(history))
}

route!(schedule_meeting => Post "/purchases/{order_id}/schedule-meeting" impl MarketplaceDatabase, PaymentGateway);
/// The buyer arranges where and when to meet the seller. Only possible while the order is `paid`.
pub async fn schedule_meeting<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<MeetingRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST schedule_meeting({order_id}) by user {}", claims.user_id());
    let order = api.schedule_meeting(order_id, claims.user_id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

route!(release_funds => Post "/purchases/{order_id}/release-funds" impl MarketplaceDatabase, PaymentGateway);
/// The buyer is happy with the item. The order completes and the seller is paid out in the background.
pub async fn release_funds<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST release_funds({order_id}) by user {}", claims.user_id());
    let order = api.release_funds(order_id, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

route!(retract_funds => Post "/purchases/{order_id}/retract-funds" impl MarketplaceDatabase, PaymentGateway);
/// The buyer backs out after the meeting. The stock goes back on sale and the payment is refunded in the background.
pub async fn retract_funds<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<RetractFundsParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST retract_funds({order_id}) by user {}", claims.user_id());
    let order = api.retract_funds(order_id, claims.user_id(), &body.reason).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

route!(rate_seller => Post "/purchases/{order_id}/rate-seller" impl MarketplaceDatabase, PaymentGateway);
pub async fn rate_seller<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<RateSellerParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST rate_seller({order_id}) with {} stars", body.rating);
    let rated = api.rate_seller(order_id, claims.user_id(), body.rating).await?;
    Ok(HttpResponse::Ok().json(RatedOrderResponse::from(rated)))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(initialize_payment => Post "/payment/paystack/initialize" impl MarketplaceDatabase, PaymentGateway);
/// Starts a Paystack checkout for the caller. The amount is calculated from the listing, never taken from the client.
pub async fn initialize_payment<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<InitializePaymentParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST initialize_payment for item {} by user {}", params.item_id, claims.user_id());
    let init = api.initialize_payment(claims.user_id(), params.item_id, params.quantity, &params.email).await?;
    Ok(HttpResponse::Ok().json(PaymentInitializationResponse::from(init)))
}

route!(paystack_callback => Get "/payment/paystack/callback" impl MarketplaceDatabase, PaymentGateway);
/// Paystack sends the buyer here after checkout.
///
/// This route is unauthenticated. The buyer, item and quantity come from the verified transaction, so the only thing
/// taken from the request is the reference. The buyer is always redirected back to the storefront: to their order on
/// success, or to the payment failure page otherwise.
pub async fn paystack_callback<B: MarketplaceDatabase, G: PaymentGateway>(
    query: web::Query<PaymentCallbackQuery>,
    api: web::Data<OrderFlowApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse {
    let location = match query.reference() {
        Some(reference) => match api.complete_payment_callback(reference).await {
            Ok(outcome) => {
                let order_id = outcome.order().id;
                debug!("💻️ Paystack callback for {reference} resolved to order {order_id}");
                options.order_url(order_id.value())
            },
            Err(e) => {
                warn!("💻️ Paystack callback for {reference} failed. {e}");
                options.payment_failure_url()
            },
        },
        None => {
            warn!("💻️ Paystack callback without a payment reference");
            options.payment_failure_url()
        },
    };
    HttpResponse::Found().insert_header((header::LOCATION, location)).finish()
}

fn into_responses(orders: Vec<OrderDetails>, viewer: UserId) -> Vec<OrderDetailsResponse> {
    orders.into_iter().map(|o| OrderDetailsResponse::for_viewer(o, viewer)).collect()
}
