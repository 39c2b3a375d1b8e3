use std::time::Duration;

use log::*;
use spawn_common::{Secret, NAIRA_CURRENCY_CODE};

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
pub const DEFAULT_PAYSTACK_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: Secret<String>,
    pub base_url: String,
    /// Where Paystack sends the buyer after checkout. When empty, the dashboard setting is used.
    pub callback_url: Option<String>,
    pub currency: String,
    pub timeout: Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: Secret::default(),
            base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(),
            callback_url: None,
            currency: NAIRA_CURRENCY_CODE.to_string(),
            timeout: DEFAULT_PAYSTACK_TIMEOUT,
        }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret_key = Secret::new(std::env::var("PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ PAYSTACK_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let base_url = std::env::var("SPAWN_PAYSTACK_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_PAYSTACK_BASE_URL.to_string());
        let callback_url = std::env::var("SPAWN_PAYSTACK_CALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        if callback_url.is_none() {
            info!("🪛️ SPAWN_PAYSTACK_CALLBACK_URL not set. Paystack will use the callback URL from the dashboard.");
        }
        let currency = std::env::var("SPAWN_PAYSTACK_CURRENCY").unwrap_or_else(|_| NAIRA_CURRENCY_CODE.to_string());
        let timeout = std::env::var("SPAWN_PAYSTACK_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid SPAWN_PAYSTACK_TIMEOUT value '{s}'. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PAYSTACK_TIMEOUT);
        Self { secret_key, base_url, callback_url, currency, timeout }
    }
}
