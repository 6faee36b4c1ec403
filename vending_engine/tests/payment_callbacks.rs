mod support;

use std::time::Duration;

use support::{fixed_paid_at, paid_callback, prepare_test_db, seed_store, Fixtures, StubDeviceChecker};
use vending_engine::{
    db_types::{CallbackStatus, MakeStatus, Money, Order, OrderNo, PaymentNotification, PaymentStatus},
    events::{EventHandlers, EventHooks, EventProducers, OrderPaidEvent},
    traits::{OrderManagement, ReconcileOutcome, VendingDatabase},
    CallbackError,
    NewOrderRequest,
    OrderFlowApi,
    PaymentReconciler,
    SqliteDatabase,
};

async fn create_waitpay_order(db: &SqliteDatabase, fx: &Fixtures) -> Order {
    let api = OrderFlowApi::new(db.clone(), StubDeviceChecker::online(), EventProducers::default());
    let request = NewOrderRequest {
        member_id: fx.member.id,
        machine_id: fx.machine.id,
        product_id: fx.product.id,
        has_cup: false,
        pay_amount: fx.product.price,
    };
    api.create_order(request).await.expect("order should be created")
}

fn reconciler(db: &SqliteDatabase) -> PaymentReconciler<SqliteDatabase> {
    PaymentReconciler::new(db.clone(), EventProducers::default())
}

#[tokio::test]
async fn successful_callback_marks_the_order_paid() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;
    let notice = paid_callback(&order);

    let ack = reconciler(&db).handle_callback(notice.clone()).await.expect("callback should be acknowledged");

    assert_eq!(ack.order_no, order.order_no);
    let paid = match ack.outcome {
        ReconcileOutcome::Paid(paid) => paid,
        other => panic!("expected a Paid outcome, got {other:?}"),
    };
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.channel_order_no.as_deref(), Some(notice.channel_order_no.as_str()));
    assert_eq!(paid.payment_time, Some(fixed_paid_at()));
    assert_eq!(paid.make_status, MakeStatus::WaitMake, "settlement must not touch fulfillment");
    assert_eq!(paid.version, order.version + 1);
}

#[tokio::test]
async fn duplicate_callbacks_are_idempotent() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;
    let notice = paid_callback(&order);
    let reconciler = reconciler(&db);

    reconciler.handle_callback(notice.clone()).await.unwrap();
    let after_first = db.fetch_order_by_order_no(&order.order_no).await.unwrap().unwrap();

    // Same callback, delivered again: acknowledged, nothing overwritten.
    let ack = reconciler.handle_callback(notice.clone()).await.unwrap();
    assert_eq!(ack.outcome, ReconcileOutcome::AlreadyProcessed(PaymentStatus::Paid));

    let after_second = db.fetch_order_by_order_no(&order.order_no).await.unwrap().unwrap();
    assert_eq!(after_second, after_first, "a duplicate delivery must be a pure no-op");
}

#[tokio::test]
async fn failure_callbacks_invalidate_the_order_terminally() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;
    let mut notice = paid_callback(&order);
    notice.status = CallbackStatus::Timeout;
    let reconciler = reconciler(&db);

    let ack = reconciler.handle_callback(notice).await.unwrap();
    assert!(matches!(ack.outcome, ReconcileOutcome::Invalidated(ref o) if o.payment_status == PaymentStatus::Invalid));

    // A success report arriving after invalidation must not resurrect the order.
    let ack = reconciler.handle_callback(paid_callback(&order)).await.unwrap();
    assert_eq!(ack.outcome, ReconcileOutcome::AlreadyProcessed(PaymentStatus::Invalid));

    let stored = db.fetch_order_by_order_no(&order.order_no).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Invalid);
    assert!(stored.payment_time.is_none());
}

#[tokio::test]
async fn unknown_orders_are_acknowledged_without_action() {
    let db = prepare_test_db().await;
    seed_store(&db).await;
    let notice = PaymentNotification {
        order_no: OrderNo("VM00000000000000000".to_string()),
        channel_order_no: "4200009999".to_string(),
        amount: Money::from_cents(100),
        status: CallbackStatus::Success,
        paid_at: fixed_paid_at(),
        signature: "c2ln".to_string(),
    };

    let ack = reconciler(&db).handle_callback(notice).await.expect("unknown orders still get an ack");
    assert_eq!(ack.outcome, ReconcileOutcome::UnknownOrder);
}

#[tokio::test]
async fn missing_signature_is_rejected_before_anything_is_trusted() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;
    let reconciler = reconciler(&db);

    for bad in ["", "   "] {
        let mut notice = paid_callback(&order);
        notice.signature = bad.to_string();
        let err = reconciler.handle_callback(notice).await.unwrap_err();
        assert!(matches!(err, CallbackError::MissingSignature));
    }

    let stored = db.fetch_order_by_order_no(&order.order_no).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::WaitPay);
}

#[tokio::test]
async fn amount_mismatch_is_acknowledged_but_never_applied() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;
    let mut notice = paid_callback(&order);
    notice.amount = order.pay_amount + Money::from_cents(1);

    let ack = reconciler(&db).handle_callback(notice).await.unwrap();
    assert_eq!(
        ack.outcome,
        ReconcileOutcome::AmountMismatch { expected: order.pay_amount, reported: order.pay_amount + Money::from_cents(1) }
    );

    let stored = db.fetch_order_by_order_no(&order.order_no).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::WaitPay, "a mismatched amount must never settle the order");
}

#[tokio::test]
async fn concurrent_duplicate_callbacks_settle_exactly_once() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;
    let notice = paid_callback(&order);
    let reconciler = reconciler(&db);

    let (a, b) = tokio::join!(reconciler.handle_callback(notice.clone()), reconciler.handle_callback(notice.clone()));
    let outcomes = [a.unwrap().outcome, b.unwrap().outcome];

    let settled = outcomes.iter().filter(|o| matches!(o, ReconcileOutcome::Paid(_))).count();
    let no_ops =
        outcomes.iter().filter(|o| matches!(o, ReconcileOutcome::AlreadyProcessed(PaymentStatus::Paid))).count();
    assert_eq!(settled, 1, "exactly one delivery may win the WaitPay guard: {outcomes:?}");
    assert_eq!(no_ops, 1, "the losing delivery must degrade to the idempotent no-op: {outcomes:?}");

    let stored = db.fetch_order_by_order_no(&order.order_no).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.payment_time, Some(fixed_paid_at()));
}

#[tokio::test]
async fn internal_failures_are_swallowed_at_the_acknowledgement_boundary() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;
    let reconciler = reconciler(&db);

    // Sever the storage underneath the reconciler. A negative acknowledgement could not fix
    // this; it would only trigger unbounded provider retries.
    let mut broken = db.clone();
    broken.close().await.unwrap();

    let ack = reconciler.handle_callback(paid_callback(&order)).await.expect("the provider still gets an ack");
    assert_eq!(ack.outcome, ReconcileOutcome::Deferred);
}

#[tokio::test]
async fn order_paid_hook_fires_on_settlement() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let order = create_waitpay_order(&db, &fx).await;

    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(move |ev: OrderPaidEvent| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(ev.order.order_no).await;
        })
    });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let reconciler = PaymentReconciler::new(db.clone(), producers);
    reconciler.handle_callback(paid_callback(&order)).await.unwrap();

    let notified = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("order-paid hook did not fire in time")
        .expect("event channel closed unexpectedly");
    assert_eq!(notified, order.order_no);
}

#[test]
fn callback_payload_wire_contract() {
    let json = r#"{
        "order_no": "VM20240612093000123",
        "channel_order_no": "4200001234202406121234567890",
        "amount": 1200,
        "status": "Success",
        "paid_at": "2024-06-12T09:30:05Z",
        "signature": "c2lnbmF0dXJl"
    }"#;
    let notice: PaymentNotification = serde_json::from_str(json).expect("payload should deserialize");
    assert_eq!(notice.order_no.as_str(), "VM20240612093000123");
    assert_eq!(notice.amount, Money::from_cents(1200));
    assert!(notice.status.is_success());
    assert_eq!(notice.paid_at, fixed_paid_at());

    let round_trip = serde_json::to_string(&notice).expect("payload should serialize");
    let again: PaymentNotification = serde_json::from_str(&round_trip).unwrap();
    assert_eq!(again.order_no, notice.order_no);
    assert_eq!(again.amount, notice.amount);
}
