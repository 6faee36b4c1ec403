use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::CallbackError,
    db_types::{Order, OrderNo, PaymentNotification, PaymentStatus},
    events::{EventProducers, OrderPaidEvent},
    traits::{CallbackAck, ReconcileOutcome, StoreError, VendingDatabase},
};

/// `PaymentReconciler` consumes payment-provider callbacks and applies them to orders exactly
/// once.
///
/// Providers deliver callbacks at-least-once and routinely duplicate them, so the reconciler is
/// built around two asymmetric rules:
///
/// * the *mutation* is fail-closed: it only happens through a conditional update guarded on
///   `payment_status = WaitPay`, so of N concurrent duplicates exactly one applies and the rest
///   degrade to no-ops;
/// * the *acknowledgement* is fail-open: unknown orders and internal failures are logged and
///   acknowledged anyway, because a negative acknowledgement cannot fix an internal bug — it
///   only triggers unbounded provider retries. An operator intervenes instead.
///
/// The one exception is a missing signature, which rejects the request outright before anything
/// is trusted.
pub struct PaymentReconciler<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PaymentReconciler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentReconciler")
    }
}

impl<B> PaymentReconciler<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> PaymentReconciler<B>
where B: VendingDatabase
{
    /// Applies a payment-provider callback to the order it references and returns the
    /// acknowledgement for the provider.
    ///
    /// Delivering the same callback N times produces the same final order state as delivering it
    /// once: only a `WaitPay` order is ever mutated, and `payment_time`/`channel_order_no` are
    /// written by the single delivery that wins the guard.
    pub async fn handle_callback(&self, notice: PaymentNotification) -> Result<CallbackAck, CallbackError> {
        if notice.signature.trim().is_empty() {
            warn!("💰️ Rejecting payment callback for {}: missing signature", notice.order_no);
            return Err(CallbackError::MissingSignature);
        }
        let order_no = notice.order_no.clone();
        let outcome = match self.apply(notice).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "💰️ Internal failure while processing the payment callback for {order_no}: {e}. Acknowledging \
                     anyway; an operator must reconcile this order by hand."
                );
                ReconcileOutcome::Deferred
            },
        };
        Ok(CallbackAck::new(order_no, outcome))
    }

    async fn apply(&self, notice: PaymentNotification) -> Result<ReconcileOutcome, StoreError> {
        let Some(order) = self.db.fetch_order_by_order_no(&notice.order_no).await? else {
            warn!("💰️ Payment callback for unknown order {}. Acknowledging without action.", notice.order_no);
            return Ok(ReconcileOutcome::UnknownOrder);
        };
        if order.payment_status != PaymentStatus::WaitPay {
            debug!(
                "💰️ Callback for order {} ignored: already {}. Idempotent no-op.",
                order.order_no, order.payment_status
            );
            return Ok(ReconcileOutcome::AlreadyProcessed(order.payment_status));
        }
        if !notice.status.is_success() {
            return match self.db.mark_order_invalid(&notice.order_no).await? {
                Some(order) => {
                    info!("💰️ Order [{}] marked Invalid: provider reported {}", order.order_no, notice.status);
                    Ok(ReconcileOutcome::Invalidated(order))
                },
                None => self.already_processed(&notice.order_no).await,
            };
        }
        if notice.amount != order.pay_amount {
            error!(
                "💰️ Amount mismatch on the callback for {}: order wants {}, provider reported {}. Leaving the \
                 order untouched for an operator.",
                order.order_no, order.pay_amount, notice.amount
            );
            return Ok(ReconcileOutcome::AmountMismatch { expected: order.pay_amount, reported: notice.amount });
        }
        match self.db.mark_order_paid(&notice.order_no, &notice.channel_order_no, notice.paid_at).await? {
            Some(order) => {
                info!("💰️ Order [{}] paid: {} via {}", order.order_no, order.pay_amount, notice.channel_order_no);
                self.call_order_paid_hook(&order).await;
                Ok(ReconcileOutcome::Paid(order))
            },
            // Lost the WaitPay guard to a concurrent duplicate delivery.
            None => self.already_processed(&notice.order_no).await,
        }
    }

    async fn already_processed(&self, order_no: &OrderNo) -> Result<ReconcileOutcome, StoreError> {
        match self.db.fetch_order_by_order_no(order_no).await? {
            Some(order) => Ok(ReconcileOutcome::AlreadyProcessed(order.payment_status)),
            None => Ok(ReconcileOutcome::UnknownOrder),
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            debug!("💰️ Notifying order-paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
