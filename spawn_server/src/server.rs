use std::time::Duration;

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use log::*;
use spawn_engine::{events::EventProducers, OrderFlowApi, OrderFlowOptions, SqliteDatabase};

use crate::{
    auth::SpawnAuthority,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{create_event_handlers, email::Mailer, paystack::PaystackGateway},
    routes::{
        health,
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
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PaystackGateway::new(config.paystack.clone())?;
    let mailer = match config.email.clone() {
        Some(email) => {
            let mailer = Mailer::new(email, ServerOptions::from_config(&config))
                .map_err(|e| ServerError::InitializeError(e.to_string()))?;
            Some(mailer)
        },
        None => {
            warn!("🪛️ No email provider has been configured. Order confirmations will not be sent.");
            None
        },
    };
    let handlers = create_event_handlers(config.event_buffer_size, gateway.clone(), mailer);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let authority = SpawnAuthority::new(&config.auth);
    let options = ServerOptions::from_config(&config);
    let flow_options =
        OrderFlowOptions { gateway_timeout: config.payment_verify_timeout, currency: config.paystack.currency.clone() };
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_options(flow_options.clone());
        let api_scope = web::scope("/api")
            .service(VerifyPaymentRoute::<SqliteDatabase, PaystackGateway>::new())
            // These two must be registered before `/purchases/{order_id}`
            .service(MyPurchasesRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(MySalesRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(OrderHistoryRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(ScheduleMeetingRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(ReleaseFundsRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(RetractFundsRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(RateSellerRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(InitializePaymentRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(PaystackCallbackRoute::<SqliteDatabase, PaystackGateway>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spawn::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(authority.clone()))
            .app_data(web::Data::new(options.clone()))
            .app_data(json_config())
            .app_data(path_config())
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are reported in the same shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|e: JsonPayloadError, _req: &HttpRequest| {
        debug!("💻️ Rejected request body. {e}");
        ServerError::InvalidRequestBody(e.to_string()).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|e: PathError, _req: &HttpRequest| {
        debug!("💻️ Rejected request path. {e}");
        ServerError::InvalidRequestPath(e.to_string()).into()
    })
}
