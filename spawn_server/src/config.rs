use std::{env, fmt::Display, io::Write, str::FromStr, time::Duration};

use log::*;
use paystack_tools::PaystackConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use spawn_common::Secret;
use spawn_engine::DEFAULT_VERIFY_TIMEOUT;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_SPAWN_HOST: &str = "127.0.0.1";
const DEFAULT_SPAWN_PORT: u16 = 8360;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_ORDER_REDIRECT_PATH: &str = "/declutter/purchase";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;
const DEFAULT_EMAIL_RETRIES: u32 = 3;
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// The storefront that buyers are sent back to after checkout, e.g. "https://spawn.example.com"
    pub frontend_url: String,
    /// Appended to `frontend_url`, followed by the order id, to build the post-checkout redirect
    pub order_redirect_path: String,
    /// How long to wait for Paystack to confirm a payment before giving up
    pub payment_verify_timeout: Duration,
    pub event_buffer_size: usize,
    pub paystack: PaystackConfig,
    /// When `None`, no emails are sent.
    pub email: Option<EmailConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPAWN_HOST.to_string(),
            port: DEFAULT_SPAWN_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            order_redirect_path: DEFAULT_ORDER_REDIRECT_PATH.to_string(),
            payment_verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            paystack: PaystackConfig::default(),
            email: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPAWN_HOST").ok().unwrap_or_else(|| DEFAULT_SPAWN_HOST.into());
        let port = parse_env_var("SPAWN_PORT", DEFAULT_SPAWN_PORT);
        let database_url = env::var("SPAWN_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPAWN_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let frontend_url = env::var("SPAWN_FRONTEND_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                warn!("🪛️ SPAWN_FRONTEND_URL is not set. Buyers will be redirected to {DEFAULT_FRONTEND_URL}.");
                DEFAULT_FRONTEND_URL.to_string()
            });
        let order_redirect_path =
            env::var("SPAWN_ORDER_REDIRECT_PATH").unwrap_or_else(|_| DEFAULT_ORDER_REDIRECT_PATH.to_string());
        let payment_verify_timeout =
            Duration::from_secs(parse_env_var("SPAWN_PAYMENT_VERIFY_TIMEOUT", DEFAULT_VERIFY_TIMEOUT.as_secs()));
        let event_buffer_size = parse_env_var("SPAWN_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let paystack = PaystackConfig::new_from_env_or_default();
        let email = EmailConfig::from_env();
        Self {
            host,
            port,
            database_url,
            auth,
            frontend_url,
            order_redirect_path,
            payment_verify_timeout,
            event_buffer_size,
            paystack,
            email,
        }
    }
}

fn parse_env_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the service that issues access tokens to users
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since no existing access tokens will be accepted. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the SPAWN_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("SPAWN_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [SPAWN_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "SPAWN_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  EmailConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// The HTTP endpoint of the transactional mail provider. Messages are POSTed to it as JSON.
    pub api_url: String,
    pub api_key: Secret<String>,
    pub from: String,
    /// How many times a failed send is retried before giving up
    pub retries: u32,
}

impl EmailConfig {
    pub fn from_env() -> Option<Self> {
        let Some(api_url) = env::var("SPAWN_EMAIL_API_URL").ok().filter(|s| !s.trim().is_empty()) else {
            warn!("🪛️ SPAWN_EMAIL_API_URL is not set. Order confirmation emails will NOT be sent.");
            return None;
        };
        let api_key = Secret::new(env::var("SPAWN_EMAIL_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SPAWN_EMAIL_API_KEY is not set. The mail provider will probably reject our requests.");
            String::default()
        }));
        let from = env::var("SPAWN_EMAIL_FROM").unwrap_or_else(|_| "Spawn Marketplace <no-reply@spawn.ng>".to_string());
        let retries = parse_env_var("SPAWN_EMAIL_RETRIES", DEFAULT_EMAIL_RETRIES);
        Some(Self { api_url, api_key, from, retries })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The part of the server configuration that request handlers need. It holds no secrets, so it can be shared freely.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub frontend_url: String,
    pub order_redirect_path: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { frontend_url: DEFAULT_FRONTEND_URL.to_string(), order_redirect_path: DEFAULT_ORDER_REDIRECT_PATH.into() }
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { frontend_url: config.frontend_url.clone(), order_redirect_path: config.order_redirect_path.clone() }
    }

    /// The path, relative to the storefront, where the buyer can follow their order
    pub fn order_path(&self, order_id: impl Display) -> String {
        format!("{}/{order_id}", self.order_redirect_path.trim_end_matches('/'))
    }

    pub fn order_url(&self, order_id: impl Display) -> String {
        format!("{}{}", self.frontend_url, self.order_path(order_id))
    }

    pub fn payment_failure_url(&self) -> String {
        format!("{}/payment-failure", self.frontend_url)
    }
}
