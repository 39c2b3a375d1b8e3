use std::time::Duration;

use log::*;
use reqwest::Client;
use serde::Serialize;
use spawn_engine::events::OrderCreatedEvent;
use thiserror::Error;

use crate::config::{EmailConfig, ServerOptions};

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Could not initialize the mail client. {0}")]
    Initialization(String),
    #[error("Could not reach the mail provider. {0}")]
    Unreachable(String),
    #[error("The mail provider rejected the message. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Sends transactional email through an HTTP mail API.
#[derive(Clone)]
pub struct Mailer {
    config: EmailConfig,
    options: ServerOptions,
    client: Client,
}

impl Mailer {
    pub fn new(config: EmailConfig, options: ServerOptions) -> Result<Self, EmailError> {
        let client =
            Client::builder().timeout(SEND_TIMEOUT).build().map_err(|e| EmailError::Initialization(e.to_string()))?;
        Ok(Self { config, options, client })
    }

    /// Sends the message, retrying with exponential backoff. Rejections (4xx) are not retried.
    pub async fn send(&self, email: &Email) -> Result<(), EmailError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;
        loop {
            match self.try_send(email).await {
                Ok(()) => {
                    info!("📧️ Sent '{}' to {}", email.subject, email.to);
                    return Ok(());
                },
                Err(e @ EmailError::Rejected { status, .. }) if status < 500 => return Err(e),
                Err(e) if attempt >= self.config.retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    warn!("📧️ Could not send '{}' to {}. {e}. Retrying in {}ms", email.subject, email.to, backoff.as_millis());
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                },
            }
        }
    }

    async fn try_send(&self, email: &Email) -> Result<(), EmailError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.reveal())
            .json(email)
            .send()
            .await
            .map_err(|e| EmailError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(EmailError::Rejected { status, message })
    }

    /// Lets both parties know about a new order. Failures are logged, never returned.
    pub async fn notify_order_created(&self, event: &OrderCreatedEvent) {
        for email in [self.buyer_confirmation(event), self.seller_notification(event)] {
            if let Err(e) = self.send(&email).await {
                error!("📧️ Giving up on sending '{}' to {} for order {}. {e}", email.subject, email.to, event.order.id);
            }
        }
    }

    pub fn buyer_confirmation(&self, event: &OrderCreatedEvent) -> Email {
        let OrderCreatedEvent { order, item, buyer, .. } = event;
        let body = format!(
            "<h3>Order Confirmed! 🎉</h3>\
             <p>Hi {name},</p>\
             <p>Thank you for choosing Spawn! Your payment is held securely in escrow until you confirm that you are \
             happy with your purchase.</p>\
             <p>📦 Order number: <strong>{id}</strong><br>🛒 Item: {title} × {qty}<br>💵 Total: <strong>{total}</strong>\
             <br>📍 Location: {location}</p>\
             <p>Please schedule a meeting with the seller, and only release the funds once you have inspected the \
             item.</p>\
             <p><a href=\"{url}\">Track your order</a></p>",
            name = escape_html(&buyer.username),
            id = order.id,
            title = escape_html(&item.title),
            qty = order.quantity,
            total = order.price,
            location = escape_html(&item.location),
            url = self.options.order_url(order.id.value()),
        );
        Email {
            from: self.config.from.clone(),
            to: buyer.email.clone(),
            subject: "Your Spawn order is confirmed! 🎉".to_string(),
            html: wrap_template(&body),
        }
    }

    pub fn seller_notification(&self, event: &OrderCreatedEvent) -> Email {
        let OrderCreatedEvent { order, item, buyer, seller } = event;
        let body = format!(
            "<h3>New Sale! 💰</h3>\
             <p>Hi {name},</p>\
             <p>Congratulations! Your item has been purchased. The funds will be released to you once the buyer \
             confirms the hand-over.</p>\
             <p>📦 Order number: <strong>{id}</strong><br>🛒 Item sold: {title} × {qty}<br>👤 Buyer: {buyer}\
             <br>📍 Meetup location: {location}</p>",
            name = escape_html(&seller.username),
            id = order.id,
            title = escape_html(&item.title),
            qty = order.quantity,
            buyer = escape_html(&buyer.username),
            location = escape_html(&item.location),
        );
        Email {
            from: self.config.from.clone(),
            to: seller.email.clone(),
            subject: "New sale! Prepare your item for pickup 🚚".to_string(),
            html: wrap_template(&body),
        }
    }
}

fn wrap_template(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body><div style=\"max-width:600px;margin:0 auto;font-family:sans-serif\">\
         <h2>Spawn Marketplace</h2>{body}<p style=\"font-size:0.9em;color:#666\">Need help? Contact \
         support@spawn.ng</p></div></body></html>"
    )
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}
