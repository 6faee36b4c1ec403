mod support;

use support::{paid_callback, prepare_test_db, seed_store, StubDeviceChecker, OTHER_OWNER_ID, OWNER_ID};
use vending_engine::{
    db_types::{BusinessStatus, MachineStatus, PaymentStatus},
    events::EventProducers,
    order_objects::OrderQueryFilter,
    traits::{NewMachine, NewSilo, StoreError},
    AccessError,
    FleetApi,
    FleetError,
    NewOrderRequest,
    OrderFlowApi,
    PaymentReconciler,
    SqliteDatabase,
};

fn fleet(db: &SqliteDatabase, checker: StubDeviceChecker) -> FleetApi<SqliteDatabase, StubDeviceChecker> {
    FleetApi::new(db.clone(), checker)
}

#[tokio::test]
async fn machines_and_silos_are_provisioned_with_unique_identities() {
    let db = prepare_test_db().await;
    let api = fleet(&db, StubDeviceChecker::online());

    let machine = api
        .register_machine(NewMachine { owner_id: OWNER_ID, name: "Atrium".to_string(), device_code: "DEV-A1".to_string() })
        .await
        .expect("machine should register");
    assert_eq!(machine.business_status, BusinessStatus::Close, "machines start closed");

    let silo = api
        .add_silo(NewSilo { machine_id: machine.id, silo_number: 1, max_capacity: 60 })
        .await
        .expect("silo should be added");
    assert_eq!(silo.stock, 0);
    assert!(silo.product_id.is_none());

    // Slot numbers are unique per machine.
    let err = api.add_silo(NewSilo { machine_id: machine.id, silo_number: 1, max_capacity: 60 }).await.unwrap_err();
    assert!(matches!(err, FleetError::Store(StoreError::SiloNumberTaken { silo_number: 1, .. })));

    // Device codes are unique across the fleet.
    let err = api
        .register_machine(NewMachine { owner_id: OWNER_ID, name: "Lobby".to_string(), device_code: "DEV-A1".to_string() })
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Store(StoreError::DeviceCodeTaken(code)) if code == "DEV-A1"));

    let err = api.add_silo(NewSilo { machine_id: 9999, silo_number: 1, max_capacity: 10 }).await.unwrap_err();
    assert!(matches!(err, FleetError::MachineNotFound(9999)));
}

#[tokio::test]
async fn business_status_changes_are_owner_guarded() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let api = fleet(&db, StubDeviceChecker::online());

    let err = api.set_business_status(fx.machine.id, OTHER_OWNER_ID, BusinessStatus::Close).await.unwrap_err();
    assert!(matches!(err, FleetError::Access(AccessError::PermissionDenied { .. })));

    let machine = api.set_business_status(fx.machine.id, OWNER_ID, BusinessStatus::Close).await.unwrap();
    assert_eq!(machine.business_status, BusinessStatus::Close);
    assert_eq!(machine.version, fx.machine.version + 1);

    // Setting the stored status again is a no-op, not an error.
    let machine = api.set_business_status(fx.machine.id, OWNER_ID, BusinessStatus::Close).await.unwrap();
    assert_eq!(machine.business_status, BusinessStatus::Close);
}

#[tokio::test]
async fn machine_status_derives_offline_from_reachability() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;

    let status = fleet(&db, StubDeviceChecker::online()).machine_status(fx.machine.id).await.unwrap();
    assert_eq!(status, MachineStatus::Open);

    // An unreachable controller overrides the stored Open.
    let status = fleet(&db, StubDeviceChecker::offline()).machine_status(fx.machine.id).await.unwrap();
    assert_eq!(status, MachineStatus::Offline);

    // A failed probe counts as unreachable.
    let status = fleet(&db, StubDeviceChecker::failing()).machine_status(fx.machine.id).await.unwrap();
    assert_eq!(status, MachineStatus::Offline);

    let api = fleet(&db, StubDeviceChecker::online());
    api.set_business_status(fx.machine.id, OWNER_ID, BusinessStatus::Close).await.unwrap();
    assert_eq!(api.machine_status(fx.machine.id).await.unwrap(), MachineStatus::Close);

    let err = api.machine_status(9999).await.unwrap_err();
    assert!(matches!(err, FleetError::MachineNotFound(9999)));
}

#[tokio::test]
async fn the_owner_sales_view_is_guarded_and_filterable() {
    let db = prepare_test_db().await;
    let fx = seed_store(&db).await;
    let orders = OrderFlowApi::new(db.clone(), StubDeviceChecker::online(), EventProducers::default());
    let reconciler = PaymentReconciler::new(db.clone(), EventProducers::default());
    let api = fleet(&db, StubDeviceChecker::online());

    let request = NewOrderRequest {
        member_id: fx.member.id,
        machine_id: fx.machine.id,
        product_id: fx.product.id,
        has_cup: false,
        pay_amount: fx.product.price,
    };
    let paid_order = orders.create_order(request.clone()).await.unwrap();
    reconciler.handle_callback(paid_callback(&paid_order)).await.unwrap();
    let waiting_order = orders.create_order(request).await.unwrap();

    let err = api.orders_for_machine(fx.machine.id, OTHER_OWNER_ID, OrderQueryFilter::default()).await.unwrap_err();
    assert!(matches!(err, FleetError::Access(AccessError::PermissionDenied { .. })));

    let all = api.orders_for_machine(fx.machine.id, OWNER_ID, OrderQueryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let paid = api
        .orders_for_machine(fx.machine.id, OWNER_ID, OrderQueryFilter::default().with_payment_status(PaymentStatus::Paid))
        .await
        .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].order_no, paid_order.order_no);

    let waiting = api
        .orders_for_machine(
            fx.machine.id,
            OWNER_ID,
            OrderQueryFilter::default().with_payment_status(PaymentStatus::WaitPay),
        )
        .await
        .unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].order_no, waiting_order.order_no);

    let silos = api.silos_for_machine(fx.machine.id).await.unwrap();
    assert_eq!(silos.len(), 1);
    assert_eq!(silos[0].id, fx.silo.id);
}
