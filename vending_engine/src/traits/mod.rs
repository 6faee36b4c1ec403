//! # Backend contracts for the vending engine.
//!
//! This module defines the interface contracts that storage *backends* must expose in order to
//! power the engine, plus the external collaborator seams the engine consumes.
//!
//! ## Traits
//! * [`VendingDatabase`] defines the write-side behaviour: guarded, at-most-once state changes
//!   for orders, and the optimistic-concurrency mutations for silos and machines.
//! * [`OrderManagement`] provides the read/query side for orders.
//! * [`FleetManagement`] covers machine and silo provisioning and lookups.
//! * [`CatalogManagement`] covers the member and product rows the engine needs for existence
//!   checks and pricing.
//! * [`DeviceAvailabilityChecker`] is the consumed collaborator reporting whether a machine's
//!   controller is reachable. The engine treats "unknown/error" the same as "offline".
//!
//! All state-changing operations return the updated record when their guard held, and `None`
//! when it did not, leaving interpretation (idempotent no-op vs. stale version) to the API layer.
mod catalog_management;
mod data_objects;
mod device;
mod fleet_management;
mod order_management;
mod store;

pub use catalog_management::CatalogManagement;
pub use data_objects::{CallbackAck, NewMachine, NewMember, NewProduct, NewSilo, ReconcileOutcome, RefundResult};
pub use device::{DeviceAvailabilityChecker, DeviceCheckError};
pub use fleet_management::FleetManagement;
pub use order_management::OrderManagement;
pub use store::{StoreError, VendingDatabase};
