//! # Vending engine public API
//!
//! The programmatic API of the engine. It is modular, so that callers can pick and choose the
//! functionality they need, and different concerns (order flow, callbacks, inventory) can be
//! wired against the same or different backends.
//!
//! * [`order_flow_api`] creates orders, performs owner-authorized refunds and advances the
//!   fulfillment status.
//! * [`payment_reconciler`] consumes payment-provider callbacks and idempotently advances order
//!   payment state.
//! * [`inventory_api`] owns the material-silo stock and sale-status invariants.
//! * [`fleet_api`] provisions machines and silos, toggles business status and derives the
//!   externally visible machine status from device reachability.
//! * [`ownership`] binds a machine to its owning actor before any privileged mutation.
//!
//! # API usage
//!
//! The pattern for all the APIs is the same: an API instance is created by supplying a database
//! backend that implements the traits the API requires (plus, where devices are involved, a
//! [`crate::traits::DeviceAvailabilityChecker`]).
//!
//! ```rust,ignore
//! use vending_engine::{OrderFlowApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url("sqlite://data/vending.db", 5).await?;
//! let api = OrderFlowApi::new(db, device_gateway, EventProducers::default());
//! let order = api.create_order(request).await?;
//! ```

pub mod errors;
pub mod fleet_api;
pub mod inventory_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod ownership;
pub mod payment_reconciler;
