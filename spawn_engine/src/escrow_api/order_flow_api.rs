use std::{collections::HashMap, fmt::Debug, time::Duration};

use log::*;
use spawn_common::NAIRA_CURRENCY_CODE;

use crate::{
    db_types::{Item, ItemId, MeetingDetails, NewOrder, Order, OrderId, OrderStatusEntry, User, UserId},
    escrow_api::{
        errors::OrderFlowError,
        order_objects::{CallbackOutcome, MeetingRequest, OrderDetails, OrderQueryFilter, PurchaseClaim},
        payment_objects::{PaymentInitialization, PaymentRequest, PaymentVerification, PurchaseMetadata},
    },
    events::{EventProducers, FundsReleasedEvent, OrderCreatedEvent, OrderRefundedEvent},
    rating::StarRating,
    traits::{CreatedOrder, MarketplaceDatabase, MarketplaceError, PaymentGateway, RatedOrder},
};

pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct OrderFlowOptions {
    /// How long to wait for the payment provider before giving up
    pub gateway_timeout: Duration,
    /// Payments in any other currency are rejected
    pub currency: String,
}

impl Default for OrderFlowOptions {
    fn default() -> Self {
        Self { gateway_timeout: DEFAULT_VERIFY_TIMEOUT, currency: NAIRA_CURRENCY_CODE.to_string() }
    }
}

/// `OrderFlowApi` is the primary API for moving orders through the escrow lifecycle.
///
/// Orders are created from verified payments. After that, the buyer drives the order forward by scheduling a meeting
/// with the seller, and then either releasing the funds or retracting them. Completed orders can be rated once.
///
/// Side effects outside the database (emails, payouts and refunds) are triggered by publishing events once the
/// corresponding change has been committed. Publishing never fails the request.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    options: OrderFlowOptions,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.options)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, options: OrderFlowOptions::default() }
    }

    pub fn with_options(mut self, options: OrderFlowOptions) -> Self {
        self.options = options;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    /// Creates a `paid` order for a payment that has already been verified, and reserves the stock for it.
    ///
    /// Most callers want [`Self::verify_and_create_order`] instead.
    pub async fn create_order(&self, claim: PurchaseClaim) -> Result<Order, OrderFlowError> {
        validate_claim(&claim)?;
        let new_order = NewOrder::new(claim.buyer_id, claim.item_id, claim.reference).with_quantity(claim.quantity);
        self.record_order(new_order).await
    }

    /// Asks the payment provider to confirm the payment behind `claim`, and if it checks out, creates the order.
    ///
    /// Any problem with the payment (the provider says it failed, does not answer in time, reports a different
    /// currency, or reports less than the order total) results in [`OrderFlowError::PaymentNotVerified`] and nothing
    /// is written. A payment reference can only ever be used for one order.
    pub async fn verify_and_create_order(&self, claim: PurchaseClaim) -> Result<Order, OrderFlowError> {
        validate_claim(&claim)?;
        self.ensure_reference_is_unused(&claim.reference).await?;
        let verification = self.verify_payment(&claim.reference).await?;
        let new_order = NewOrder::new(claim.buyer_id, claim.item_id, claim.reference)
            .with_quantity(claim.quantity)
            .with_paid_amount(verification.amount);
        self.record_order(new_order).await
    }

    /// Handles the payment provider redirecting the buyer back to us after checkout.
    ///
    /// The buyer, item and quantity are taken from the verified transaction's metadata, never from the request. The
    /// provider may call back more than once for the same payment, in which case the existing order is returned.
    pub async fn complete_payment_callback(&self, reference: &str) -> Result<CallbackOutcome, OrderFlowError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(OrderFlowError::ValidationError("A payment reference is required".to_string()));
        }
        if let Some(order) = self.db.fetch_order_by_payment_reference(reference).await? {
            debug!("🔄️💳️ Payment {reference} has already been processed as order {}", order.id);
            return Ok(CallbackOutcome::AlreadyProcessed(order));
        }
        let verification = self.verify_payment(reference).await?;
        let Some(PurchaseMetadata { buyer_id, item_id, quantity }) = verification.purchase_metadata() else {
            warn!("🔄️💳️ Payment {reference} was verified, but carries no purchase details");
            return Err(OrderFlowError::PaymentNotVerified(
                "The payment does not say what was purchased".to_string(),
            ));
        };
        let claim = PurchaseClaim::new(reference, item_id, buyer_id).with_quantity(quantity);
        validate_claim(&claim)?;
        let new_order =
            NewOrder::new(buyer_id, item_id, reference).with_quantity(quantity).with_paid_amount(verification.amount);
        match self.record_order(new_order).await {
            Ok(order) => Ok(CallbackOutcome::Created(order)),
            Err(OrderFlowError::InvalidState(msg)) => {
                // A concurrent callback for the same payment may have won the race
                match self.db.fetch_order_by_payment_reference(reference).await? {
                    Some(order) => Ok(CallbackOutcome::AlreadyProcessed(order)),
                    None => Err(OrderFlowError::InvalidState(msg)),
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Starts a checkout with the payment provider. The amount is always calculated here from the item's price.
    pub async fn initialize_payment(
        &self,
        buyer: UserId,
        item_id: ItemId,
        quantity: i64,
        email: &str,
    ) -> Result<PaymentInitialization, OrderFlowError> {
        if quantity < 1 {
            return Err(OrderFlowError::ValidationError(format!("Quantity must be at least 1, but was {quantity}")));
        }
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(OrderFlowError::ValidationError("A valid email address is required".to_string()));
        }
        let item = self.db.fetch_item(item_id).await?.ok_or(MarketplaceError::ItemNotFound(item_id))?;
        if item.seller_id == buyer {
            return Err(MarketplaceError::CannotBuyOwnItem.into());
        }
        if item.quantity < quantity {
            return Err(
                MarketplaceError::InventoryExhausted { item_id, requested: quantity, available: item.quantity }.into()
            );
        }
        let amount = item
            .price
            .checked_mul(quantity)
            .ok_or_else(|| OrderFlowError::ValidationError(format!("Quantity {quantity} is too large")))?;
        let metadata = PurchaseMetadata { buyer_id: buyer, item_id, quantity };
        let request = PaymentRequest { email: email.to_string(), amount, metadata };
        let init = tokio::time::timeout(self.options.gateway_timeout, self.gateway.initialize_payment(request))
            .await
            .map_err(|_| OrderFlowError::DependencyFailure("The payment provider did not respond in time".to_string()))??;
        info!("🔄️💳️ Checkout {} started for {quantity} × item {item_id} ({amount}) by user {buyer}", init.reference);
        Ok(init)
    }

    /// `paid` → `meeting_scheduled`
    pub async fn schedule_meeting(
        &self,
        order_id: OrderId,
        caller: UserId,
        meeting: MeetingRequest,
    ) -> Result<Order, OrderFlowError> {
        let meeting = MeetingDetails::from(meeting);
        if meeting.location.is_empty() {
            return Err(OrderFlowError::ValidationError("A meeting location is required".to_string()));
        }
        let order = self.db.schedule_meeting(order_id, caller, meeting).await?;
        debug!("🔄️📅️ Meeting scheduled for order {order_id}");
        Ok(order)
    }

    /// `meeting_scheduled` → `completed`. The seller payout is triggered afterwards.
    pub async fn release_funds(&self, order_id: OrderId, caller: UserId) -> Result<Order, OrderFlowError> {
        let order = self.db.release_funds(order_id, caller).await?;
        info!("🔄️💰️ Funds for order {order_id} released to seller {}", order.seller_id);
        match self.db.fetch_user(order.seller_id).await {
            Ok(Some(seller)) => self.call_funds_released_hook(FundsReleasedEvent::new(order.clone(), seller)),
            Ok(None) => error!("🔄️💰️ Seller {} of order {order_id} does not exist. No payout made.", order.seller_id),
            Err(e) => error!("🔄️💰️ Could not look up seller for order {order_id}. No payout made. {e}"),
        }
        Ok(order)
    }

    /// `meeting_scheduled` → `refund_requested` → `refunded`. The stock is restored and the refund is triggered
    /// afterwards.
    pub async fn retract_funds(&self, order_id: OrderId, caller: UserId, reason: &str) -> Result<Order, OrderFlowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(OrderFlowError::ValidationError("A reason for the refund is required".to_string()));
        }
        let order = self.db.retract_funds(order_id, caller, reason).await?;
        info!("🔄️↩️ Order {order_id} refunded: {reason}");
        self.call_order_refunded_hook(OrderRefundedEvent::new(order.clone()));
        Ok(order)
    }

    /// Rates the seller of a completed order. Returns the seller's new aggregate rating.
    pub async fn rate_seller(&self, order_id: OrderId, caller: UserId, rating: i64) -> Result<RatedOrder, OrderFlowError> {
        let stars = StarRating::try_from(rating).map_err(|e| OrderFlowError::ValidationError(e.to_string()))?;
        let rated = self.db.rate_seller(order_id, caller, stars).await?;
        debug!("🔄️⭐️ Order {order_id} rated {stars}. Seller is now at {}", rated.seller_rating);
        Ok(rated)
    }

    /// Fetches an order on behalf of `caller`, who must be either the buyer or the seller.
    pub async fn order_for_party(&self, order_id: OrderId, caller: UserId) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if !order.is_party(caller) {
            return Err(OrderFlowError::Unauthorized(format!("User {caller} is not a party to order {order_id}")));
        }
        Ok(order)
    }

    pub async fn purchases_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.search_orders(OrderQueryFilter::default().with_buyer(buyer)).await?;
        Ok(orders)
    }

    pub async fn sales_for_seller(&self, seller: UserId) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.search_orders(OrderQueryFilter::default().with_seller(seller)).await?;
        Ok(orders)
    }

    /// Like [`Self::order_for_party`], with the item and both parties attached.
    pub async fn order_details_for_party(
        &self,
        order_id: OrderId,
        caller: UserId,
    ) -> Result<OrderDetails, OrderFlowError> {
        let order = self.order_for_party(order_id, caller).await?;
        let mut details = self.attach_details(vec![order]).await?;
        details.pop().ok_or_else(|| MarketplaceError::OrderNotFound(order_id).into())
    }

    /// The buyer's purchases, newest first, each with the item and the seller attached.
    pub async fn purchase_details(&self, buyer: UserId) -> Result<Vec<OrderDetails>, OrderFlowError> {
        let orders = self.purchases_for_buyer(buyer).await?;
        self.attach_details(orders).await
    }

    /// The seller's sales, newest first, each with the item and the buyer attached.
    pub async fn sale_details(&self, seller: UserId) -> Result<Vec<OrderDetails>, OrderFlowError> {
        let orders = self.sales_for_seller(seller).await?;
        self.attach_details(orders).await
    }

    pub async fn status_history(
        &self,
        order_id: OrderId,
        caller: UserId,
    ) -> Result<Vec<OrderStatusEntry>, OrderFlowError> {
        let _ = self.order_for_party(order_id, caller).await?;
        let history = self.db.fetch_status_history(order_id).await?;
        Ok(history)
    }

    async fn attach_details(&self, orders: Vec<Order>) -> Result<Vec<OrderDetails>, OrderFlowError> {
        let mut items = HashMap::<ItemId, Item>::new();
        let mut users = HashMap::<UserId, User>::new();
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            if !items.contains_key(&order.item_id) {
                let item =
                    self.db.fetch_item(order.item_id).await?.ok_or(MarketplaceError::ItemNotFound(order.item_id))?;
                items.insert(item.id, item);
            }
            for id in [order.buyer_id, order.seller_id] {
                if !users.contains_key(&id) {
                    let user = self.db.fetch_user(id).await?.ok_or(MarketplaceError::UserNotFound(id))?;
                    users.insert(id, user);
                }
            }
            let item = items.get(&order.item_id).cloned().ok_or(MarketplaceError::ItemNotFound(order.item_id))?;
            let buyer = users.get(&order.buyer_id).cloned().ok_or(MarketplaceError::UserNotFound(order.buyer_id))?;
            let seller = users.get(&order.seller_id).cloned().ok_or(MarketplaceError::UserNotFound(order.seller_id))?;
            result.push(OrderDetails { order, item, buyer, seller });
        }
        trace!("🔄️📦️ Attached details to {} orders", result.len());
        Ok(result)
    }

    async fn ensure_reference_is_unused(&self, reference: &str) -> Result<(), OrderFlowError> {
        match self.db.fetch_order_by_payment_reference(reference).await? {
            Some(order) => Err(MarketplaceError::DuplicatePaymentReference(format!("{reference} ({})", order.id)).into()),
            None => Ok(()),
        }
    }

    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, OrderFlowError> {
        let timeout = self.options.gateway_timeout;
        let verification = match tokio::time::timeout(timeout, self.gateway.verify_payment(reference)).await {
            Err(_) => {
                warn!("🔄️💳️ Payment provider did not verify {reference} within {}s", timeout.as_secs());
                return Err(OrderFlowError::PaymentNotVerified("The payment provider did not respond in time".into()));
            },
            Ok(Err(e)) => {
                warn!("🔄️💳️ Could not verify payment {reference}. {e}");
                return Err(OrderFlowError::PaymentNotVerified(e.to_string()));
            },
            Ok(Ok(v)) => v,
        };
        if !verification.status.is_success() {
            info!("🔄️💳️ Payment {reference} has status {}", verification.status);
            return Err(OrderFlowError::PaymentNotVerified(format!("The payment was {}", verification.status)));
        }
        if verification.reference != reference {
            warn!("🔄️💳️ Asked to verify {reference}, but the provider answered for {}", verification.reference);
            return Err(OrderFlowError::PaymentNotVerified("The payment reference does not match".into()));
        }
        if !verification.currency.eq_ignore_ascii_case(&self.options.currency) {
            warn!("🔄️💳️ Payment {reference} was made in {}, not {}", verification.currency, self.options.currency);
            return Err(OrderFlowError::PaymentNotVerified(format!(
                "Payments must be made in {}",
                self.options.currency
            )));
        }
        trace!("🔄️💳️ Payment {reference} verified for {}", verification.amount);
        Ok(verification)
    }

    async fn record_order(&self, new_order: NewOrder) -> Result<Order, OrderFlowError> {
        let reference = new_order.payment_reference.clone();
        let created: CreatedOrder = self.db.create_order_for_item(new_order).await.map_err(|e| {
            debug!("🔄️📦️ Order for payment {reference} was not created. {e}");
            OrderFlowError::from(e)
        })?;
        let order = created.order.clone();
        info!("🔄️📦️ Order {} created for payment {reference}", order.id);
        self.call_order_created_hook(OrderCreatedEvent::from(created));
        Ok(order)
    }

    fn call_order_created_hook(&self, event: OrderCreatedEvent) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(event.clone());
        }
    }

    fn call_funds_released_hook(&self, event: FundsReleasedEvent) {
        for emitter in &self.producers.funds_released_producer {
            debug!("🔄️💰️ Notifying funds released hook subscribers");
            emitter.publish_event(event.clone());
        }
    }

    fn call_order_refunded_hook(&self, event: OrderRefundedEvent) {
        for emitter in &self.producers.order_refunded_producer {
            debug!("🔄️↩️ Notifying order refunded hook subscribers");
            emitter.publish_event(event.clone());
        }
    }
}

fn validate_claim(claim: &PurchaseClaim) -> Result<(), OrderFlowError> {
    if claim.reference.trim().is_empty() {
        return Err(OrderFlowError::ValidationError("A payment reference is required".to_string()));
    }
    if claim.quantity < 1 {
        return Err(OrderFlowError::ValidationError(format!("Quantity must be at least 1, but was {}", claim.quantity)));
    }
    Ok(())
}
