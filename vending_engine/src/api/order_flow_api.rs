use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    api::{
        errors::OrderFlowError,
        order_objects::NewOrderRequest,
        ownership::OwnershipValidator,
    },
    db_types::{BusinessStatus, MakeStatus, NewOrder, Order, OrderNo, PaymentStatus, SaleStatus},
    events::{EventProducers, OrderCreatedEvent, OrderRefundedEvent},
    helpers::OrderNumberGenerator,
    traits::{DeviceAvailabilityChecker, RefundResult, StoreError, VendingDatabase},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: creating orders in response to
/// member purchase requests, performing owner-authorized refunds, and advancing the fulfillment
/// status of paid orders.
pub struct OrderFlowApi<B, D> {
    db: B,
    device_checker: D,
    order_numbers: OrderNumberGenerator,
    ownership: OwnershipValidator<B>,
    producers: EventProducers,
}

impl<B, D> Debug for OrderFlowApi<B, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone, D> OrderFlowApi<B, D> {
    pub fn new(db: B, device_checker: D, producers: EventProducers) -> Self {
        let ownership = OwnershipValidator::new(db.clone());
        Self { db, device_checker, order_numbers: OrderNumberGenerator::default(), ownership, producers }
    }

    /// Replaces the default order-number prefix. Useful when several deployments share one
    /// payment-provider account and order numbers must stay distinguishable.
    pub fn with_order_prefix(mut self, prefix: &str) -> Self {
        self.order_numbers = OrderNumberGenerator::new(prefix);
        self
    }
}

impl<B, D> OrderFlowApi<B, D>
where
    B: VendingDatabase,
    D: DeviceAvailabilityChecker,
{
    /// Creates a new order for a member's purchase.
    ///
    /// The order is only created when the machine and its device are actually available:
    /// * the member, machine and product must exist,
    /// * the machine must be open for business,
    /// * the machine's controller must be reachable right now — an unreachable or unknown device
    ///   refuses the order outright (unattended hardware cannot later catch up a missed
    ///   dispense),
    /// * a silo on the machine must carry the product, on sale and stocked,
    /// * the pay amount must be positive and no more than the product price.
    ///
    /// On success the order is persisted in `{WaitPay, WaitMake}`. No payment has occurred yet
    /// and no inventory is touched; dispense is gated entirely on `payment_status = Paid`.
    pub async fn create_order(&self, request: NewOrderRequest) -> Result<Order, OrderFlowError> {
        let member = self
            .db
            .fetch_member(request.member_id)
            .await?
            .ok_or(OrderFlowError::MemberNotFound(request.member_id))?;
        let machine = self
            .db
            .fetch_machine(request.machine_id)
            .await?
            .ok_or(OrderFlowError::MachineNotFound(request.machine_id))?;
        if machine.business_status != BusinessStatus::Open {
            return Err(OrderFlowError::MachineNotAvailable(machine.id));
        }
        let online = self.device_checker.is_online(&machine.device_code).await.unwrap_or_else(|e| {
            warn!("📡️ Device probe for {} failed: {e}. Treating the device as offline.", machine.device_code);
            false
        });
        if !online {
            return Err(OrderFlowError::DeviceOffline(machine.device_code));
        }
        let product = self
            .db
            .fetch_product(request.product_id)
            .await?
            .ok_or(OrderFlowError::ProductNotFound(request.product_id))?;
        let silo = self
            .db
            .fetch_silo_for_product(machine.id, product.id)
            .await?
            .filter(|s| s.sale_status == SaleStatus::On)
            .ok_or(OrderFlowError::ProductNotOnSale { machine_id: machine.id, product_id: product.id })?;
        if silo.stock <= 0 {
            return Err(OrderFlowError::StockEmpty(silo.id));
        }
        let total_amount = product.price;
        if !request.pay_amount.is_positive() || request.pay_amount > total_amount {
            return Err(OrderFlowError::InvalidPaymentAmount { pay_amount: request.pay_amount, total_amount });
        }
        let order_no = self.order_numbers.next();
        let mut new_order = NewOrder::new(order_no, member.id, machine.id, product.id, total_amount)
            .with_pay_amount(request.pay_amount);
        if request.has_cup {
            new_order = new_order.with_cup();
        }
        let order = self.db.insert_order(new_order).await?;
        debug!(
            "🧾️ Order [{}] created for member #{} on machine #{}: {} to pay",
            order.order_no, order.member_id, order.machine_id, order.pay_amount
        );
        self.call_order_created_hook(&order).await;
        Ok(order)
    }

    /// Refunds a paid order on behalf of the owning machine's owner.
    ///
    /// The order must exist and be `Paid` — refunding an unpaid order is rejected with
    /// `InvalidOrderStatus` and a second refund with `OrderAlreadyRefunded`. The actor must own
    /// the machine the order was placed on. The transition is guarded on `Paid` in the store, so
    /// a concurrent double-refund can only succeed once; the loser is told the order is already
    /// refunded.
    pub async fn refund(&self, order_id: i64, reason: &str, actor: i64) -> Result<RefundResult, OrderFlowError> {
        let order =
            self.db.fetch_order_by_id(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        self.ownership.validate(order.machine_id, actor).await?;
        match order.payment_status {
            PaymentStatus::Paid => {},
            PaymentStatus::Refunded => return Err(OrderFlowError::OrderAlreadyRefunded(order.order_no)),
            status => {
                return Err(OrderFlowError::InvalidOrderStatus { order_no: order.order_no, status });
            },
        }
        let refund_time = Utc::now();
        match self.db.refund_order(order.id, reason, refund_time).await? {
            Some(order) => {
                info!("💸️ Order [{}] refunded: {} ({reason})", order.order_no, order.pay_amount);
                self.call_order_refunded_hook(&order).await;
                let refund_amount = order.refund_amount.unwrap_or(order.pay_amount);
                let refund_time = order.refund_time.unwrap_or(refund_time);
                Ok(RefundResult { order, refund_amount, refund_time })
            },
            // The guard failed: somebody else moved the order between our read and the write.
            None => {
                let current =
                    self.db.fetch_order_by_id(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
                if current.payment_status == PaymentStatus::Refunded {
                    Err(OrderFlowError::OrderAlreadyRefunded(current.order_no))
                } else {
                    Err(OrderFlowError::InvalidOrderStatus {
                        order_no: current.order_no,
                        status: current.payment_status,
                    })
                }
            },
        }
    }

    /// Advances the fulfillment status of an order.
    ///
    /// Transitions are forward-only:
    ///
    /// | From \ To | Making | Made | MakeFail |
    /// |-----------|--------|------|----------|
    /// | WaitMake  | 1      | Err  | Err      |
    /// | Making    | Err    | ok   | ok       |
    /// | Made      | Err    | Err  | Err      |
    /// | MakeFail  | Err    | Err  | Err      |
    ///
    /// (1) requires the order to be `Paid`; dispense never starts against an unpaid order.
    ///
    /// `MakeFail` is recorded as a terminal signal for a separate compensation workflow (owner
    /// refund, manual queue); the engine draws no automatic conclusion from it.
    pub async fn update_make_status(&self, order_no: &OrderNo, to: MakeStatus) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_order_no(order_no)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNoNotFound(order_no.clone()))?;
        let from = order.make_status;
        if !from.can_transition_to(to) {
            return Err(OrderFlowError::IllegalMakeTransition { order_no: order.order_no, from, to });
        }
        if to == MakeStatus::Making && order.payment_status != PaymentStatus::Paid {
            return Err(OrderFlowError::OrderNotPaid(order.order_no));
        }
        match self.db.set_make_status(order_no, from, to).await? {
            Some(updated) => {
                debug!("⚙️ Order [{}] fulfillment moved {from} -> {to}", updated.order_no);
                Ok(updated)
            },
            None => Err(StoreError::ConcurrentUpdate { entity: "order", id: order.id }.into()),
        }
    }

    /// Soft-marks an order so it no longer shows up in queries. Orders are never hard-deleted.
    pub async fn archive_order(&self, order_no: &OrderNo, actor: i64) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_order_no(order_no)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNoNotFound(order_no.clone()))?;
        self.ownership.validate(order.machine_id, actor).await?;
        self.db
            .mark_order_deleted(order_no)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNoNotFound(order_no.clone()))
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            let event = OrderCreatedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_refunded_hook(&self, order: &Order) {
        for emitter in &self.producers.order_refunded_producer {
            let event = OrderRefundedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
