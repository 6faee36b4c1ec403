//! Shared scaffolding for the integration tests: a throwaway SQLite database with migrations
//! applied, a seeded store, and a scriptable device-availability stub.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};
use vending_engine::{
    db_types::{BusinessStatus, Machine, MaterialSilo, Member, Money, Order, PaymentNotification, Product, SaleStatus},
    traits::{
        CatalogManagement,
        DeviceAvailabilityChecker,
        DeviceCheckError,
        FleetManagement,
        NewMachine,
        NewMember,
        NewProduct,
        NewSilo,
    },
    SqliteDatabase,
};

pub const OWNER_ID: i64 = 501;
pub const OTHER_OWNER_ID: i64 = 666;

pub async fn prepare_test_db() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::builder().is_test(true).try_init();
    debug!("🚀️ Logging initialised");
    let url = random_db_url();
    let _ = Sqlite::drop_database(&url).await;
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/db/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete for {url}");
    db
}

pub fn random_db_url() -> String {
    format!("sqlite://{}/vending_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub struct Fixtures {
    pub member: Member,
    pub product: Product,
    pub machine: Machine,
    pub silo: MaterialSilo,
}

/// Seeds a member, a priced product and an open machine (owned by [`OWNER_ID`]) with one silo
/// carrying the product: assigned, stocked and on sale.
pub async fn seed_store(db: &SqliteDatabase) -> Fixtures {
    let member = db
        .insert_member(NewMember { nickname: "walk-up".to_string(), mobile: None })
        .await
        .expect("member should be inserted");
    let product = db
        .insert_product(NewProduct { name: "Latte".to_string(), price: Money::from_cents(1200) })
        .await
        .expect("product should be inserted");
    let machine = db
        .insert_machine(NewMachine {
            owner_id: OWNER_ID,
            name: "Lobby machine".to_string(),
            device_code: format!("DEV-{:08x}", rand::random::<u32>()),
        })
        .await
        .expect("machine should be inserted");
    let machine = db
        .set_business_status(machine.id, BusinessStatus::Open, machine.version)
        .await
        .expect("business status update should not fail")
        .expect("machine should still exist");
    let silo = db
        .insert_silo(NewSilo { machine_id: machine.id, silo_number: 1, max_capacity: 50 })
        .await
        .expect("silo should be inserted");
    let silo = db
        .assign_silo_product(silo.id, product.id, silo.version)
        .await
        .expect("product assignment should not fail")
        .expect("silo should still exist");
    let silo = db
        .update_silo_stock(silo.id, 10, silo.version)
        .await
        .expect("stock update should not fail")
        .expect("silo should still exist");
    let silo = db
        .set_silo_sale_status(silo.id, SaleStatus::On, silo.version)
        .await
        .expect("sale toggle should not fail")
        .expect("silo should still exist");
    Fixtures { member, product, machine, silo }
}

/// A successful provider callback for the given order, with a fixed whole-second timestamp so
/// round-trips through storage compare exactly.
pub fn paid_callback(order: &Order) -> PaymentNotification {
    PaymentNotification {
        order_no: order.order_no.clone(),
        channel_order_no: "4200001234202406121234567890".to_string(),
        amount: order.pay_amount,
        status: vending_engine::db_types::CallbackStatus::Success,
        paid_at: fixed_paid_at(),
        signature: "c2lnbmF0dXJl".to_string(),
    }
}

pub fn fixed_paid_at() -> DateTime<Utc> {
    "2024-06-12T09:30:05Z".parse().expect("valid timestamp")
}

#[derive(Debug, Clone, Copy)]
enum Probe {
    Online,
    Offline,
    Error,
}

/// Scriptable device-availability checker: always online, always offline, or failing probes.
#[derive(Debug, Clone)]
pub struct StubDeviceChecker {
    probe: Probe,
}

impl StubDeviceChecker {
    pub fn online() -> Self {
        Self { probe: Probe::Online }
    }

    pub fn offline() -> Self {
        Self { probe: Probe::Offline }
    }

    pub fn failing() -> Self {
        Self { probe: Probe::Error }
    }
}

impl DeviceAvailabilityChecker for StubDeviceChecker {
    async fn is_online(&self, _device_code: &str) -> Result<bool, DeviceCheckError> {
        match self.probe {
            Probe::Online => Ok(true),
            Probe::Offline => Ok(false),
            Probe::Error => Err(DeviceCheckError("probe timed out".to_string())),
        }
    }
}
