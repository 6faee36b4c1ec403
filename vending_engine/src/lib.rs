//! Vending Engine
//!
//! The core commerce engine for a fleet of unattended vending machines: member purchases,
//! payment settlement via asynchronous provider callbacks, and material-silo inventory control.
//! This library contains the order lifecycle, payment reconciliation and inventory gating logic.
//! It is transport-agnostic — HTTP routing, credential handling and provider signature
//! verification live in the surrounding server, not here.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly; use the public API instead. The
//!    exception is the data types stored in the database, which are defined in the [`db_types`]
//!    module and are public.
//! 2. The engine public API ([`mod@api`]). Backends implement the traits in the [`traits`]
//!    module in order to power the APIs: [`OrderFlowApi`] for the order lifecycle,
//!    [`PaymentReconciler`] for provider callbacks, [`InventoryApi`] for silo control and
//!    [`FleetApi`] for machine provisioning and status.
//!
//! The engine also emits events when orders are created, paid, or refunded. A simple hook
//! system ([`events`]) lets downstream components — most importantly the dispense controller —
//! subscribe and react without being wired into the engine itself.
mod api;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use api::{
    errors::{AccessError, CallbackError, FleetError, InventoryError, OrderFlowError},
    fleet_api::FleetApi,
    inventory_api::InventoryApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    order_objects::NewOrderRequest,
    ownership::OwnershipValidator,
    payment_reconciler::PaymentReconciler,
};
