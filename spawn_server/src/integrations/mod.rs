//! Side effects that happen after an order changes: emails, seller payouts and refunds.
//!
//! These run on the event handler tasks, never on the request path. Failures are logged and dropped; the order
//! itself has already been committed by the time a hook runs.
pub mod email;
pub mod paystack;

use log::*;
use spawn_engine::events::{EventHandlers, EventHooks};

use crate::integrations::{email::Mailer, paystack::PaystackGateway};

pub fn create_event_handlers(buffer_size: usize, paystack: PaystackGateway, mailer: Option<Mailer>) -> EventHandlers {
    let mut hooks = EventHooks::default();
    if let Some(mailer) = mailer {
        hooks.on_order_created(move |ev| {
            let mailer = mailer.clone();
            Box::pin(async move {
                mailer.notify_order_created(&ev).await;
            })
        });
    }
    let payouts = paystack.clone();
    hooks.on_funds_released(move |ev| {
        let paystack = payouts.clone();
        Box::pin(async move {
            let order_id = ev.order.id;
            let Some(recipient) = ev.seller.payout_recipient.as_deref() else {
                warn!(
                    "💳️ Seller {} has no payout recipient. The {} for order {order_id} must be paid out manually.",
                    ev.seller.id, ev.order.price
                );
                return;
            };
            let reason = format!("Spawn order {order_id}");
            match paystack.api().transfer(recipient, ev.order.price, &reason).await {
                Ok(transfer) => {
                    info!("💳️ Paid {} to seller {} for order {order_id} ({})", ev.order.price, ev.seller.id, transfer.transfer_code)
                },
                Err(e) => error!("💳️ Payout for order {order_id} failed. It must be paid out manually. {e}"),
            }
        })
    });
    hooks.on_order_refunded(move |ev| {
        let paystack = paystack.clone();
        Box::pin(async move {
            let order_id = ev.order.id;
            let note = ev.order.refund_reason.clone();
            match paystack.api().refund(&ev.order.payment_reference, note).await {
                Ok(refund) => info!("💳️ Refund for order {order_id} is {}", refund.status),
                Err(e) => error!("💳️ Refund of order {order_id} failed. It must be refunded manually. {e}"),
            }
        })
    });
    EventHandlers::new(buffer_size, hooks)
}
