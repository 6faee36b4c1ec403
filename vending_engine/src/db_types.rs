//! Canonical domain types for the vending engine.
//!
//! Every status vocabulary lives here as a single tagged enum with one string form, consumed by
//! both the persistence layer (sqlx `Type`) and external-facing payloads (serde). The engine never
//! carries parallel integer codes for the same state.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use vmc_common::Money;

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      OrderNo      -----------------------------------------------------------
/// The external, human-traceable order number. Generated once at order creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNo(pub String);

impl FromStr for OrderNo {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNo {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNo {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   PaymentStatus   -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The order exists but no payment has been applied yet.
    WaitPay,
    /// The payment provider confirmed settlement in full.
    Paid,
    /// The provider reported a failed, cancelled or timed-out payment attempt.
    Invalid,
    /// A previously paid order has been refunded by the machine owner.
    Refunded,
}

impl PaymentStatus {
    /// Invalid and Refunded are terminal. No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Invalid | PaymentStatus::Refunded)
    }

    /// The only legal movements are WaitPay→Paid, WaitPay→Invalid and Paid→Refunded.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!((self, next), (WaitPay, Paid) | (WaitPay, Invalid) | (Paid, Refunded))
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::WaitPay => write!(f, "WaitPay"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Invalid => write!(f, "Invalid"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WaitPay" => Ok(Self::WaitPay),
            "Paid" => Ok(Self::Paid),
            "Invalid" => Ok(Self::Invalid),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------    MakeStatus     -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum MakeStatus {
    /// Dispense has not started. The only state in which payment may still be pending.
    WaitMake,
    /// The machine is preparing the product. Requires the order to be Paid.
    Making,
    /// Dispense completed.
    Made,
    /// Dispense failed. Compensation (refund, manual queue) is an explicit separate workflow.
    MakeFail,
}

impl MakeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MakeStatus::Made | MakeStatus::MakeFail)
    }

    pub fn can_transition_to(self, next: MakeStatus) -> bool {
        use MakeStatus::*;
        matches!((self, next), (WaitMake, Making) | (Making, Made) | (Making, MakeFail))
    }
}

impl Display for MakeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MakeStatus::WaitMake => write!(f, "WaitMake"),
            MakeStatus::Making => write!(f, "Making"),
            MakeStatus::Made => write!(f, "Made"),
            MakeStatus::MakeFail => write!(f, "MakeFail"),
        }
    }
}

impl FromStr for MakeStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WaitMake" => Ok(Self::WaitMake),
            "Making" => Ok(Self::Making),
            "Made" => Ok(Self::Made),
            "MakeFail" => Ok(Self::MakeFail),
            s => Err(ConversionError(format!("Invalid make status: {s}"))),
        }
    }
}

//--------------------------------------    SaleStatus     -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SaleStatus {
    On,
    Off,
}

impl Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleStatus::On => write!(f, "On"),
            SaleStatus::Off => write!(f, "Off"),
        }
    }
}

impl FromStr for SaleStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "On" => Ok(Self::On),
            "Off" => Ok(Self::Off),
            s => Err(ConversionError(format!("Invalid sale status: {s}"))),
        }
    }
}

//--------------------------------------  BusinessStatus   -----------------------------------------------------------
/// The operator-controlled half of a machine's status. `Offline` is never stored; it is derived
/// from device reachability at read time (see [`MachineStatus`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum BusinessStatus {
    Open,
    Close,
}

impl Display for BusinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusinessStatus::Open => write!(f, "Open"),
            BusinessStatus::Close => write!(f, "Close"),
        }
    }
}

impl FromStr for BusinessStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Close" => Ok(Self::Close),
            s => Err(ConversionError(format!("Invalid business status: {s}"))),
        }
    }
}

/// The externally visible machine status. An unreachable controller overrides whatever business
/// status is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Open,
    Close,
    Offline,
}

impl From<BusinessStatus> for MachineStatus {
    fn from(status: BusinessStatus) -> Self {
        match status {
            BusinessStatus::Open => MachineStatus::Open,
            BusinessStatus::Close => MachineStatus::Close,
        }
    }
}

impl Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineStatus::Open => write!(f, "Open"),
            MachineStatus::Close => write!(f, "Close"),
            MachineStatus::Offline => write!(f, "Offline"),
        }
    }
}

//--------------------------------------  CallbackStatus   -----------------------------------------------------------
/// The result field of a payment-provider callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackStatus {
    Success,
    Failure,
    Cancel,
    Timeout,
    Exception,
}

impl CallbackStatus {
    pub fn is_success(self) -> bool {
        matches!(self, CallbackStatus::Success)
    }
}

impl Display for CallbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackStatus::Success => write!(f, "Success"),
            CallbackStatus::Failure => write!(f, "Failure"),
            CallbackStatus::Cancel => write!(f, "Cancel"),
            CallbackStatus::Timeout => write!(f, "Timeout"),
            CallbackStatus::Exception => write!(f, "Exception"),
        }
    }
}

//--------------------------------------      Order        -----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_no: OrderNo,
    pub member_id: i64,
    pub machine_id: i64,
    pub product_id: i64,
    pub has_cup: bool,
    pub total_amount: Money,
    pub pay_amount: Money,
    pub payment_status: PaymentStatus,
    pub make_status: MakeStatus,
    /// The payment provider's transaction reference, recorded when the order is marked Paid.
    pub channel_order_no: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
    pub refund_time: Option<DateTime<Utc>>,
    pub refund_amount: Option<Money>,
    pub refund_reason: Option<String>,
    /// Optimistic-concurrency counter. Every state-changing write increments it and conditions on
    /// the value read at load time.
    pub version: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewOrder      -----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The engine-generated external order number.
    pub order_no: OrderNo,
    pub member_id: i64,
    pub machine_id: i64,
    pub product_id: i64,
    pub has_cup: bool,
    /// The undiscounted product price at order time.
    pub total_amount: Money,
    /// The amount the member actually owes. Never exceeds `total_amount`.
    pub pay_amount: Money,
}

impl NewOrder {
    pub fn new(order_no: OrderNo, member_id: i64, machine_id: i64, product_id: i64, amount: Money) -> Self {
        Self { order_no, member_id, machine_id, product_id, has_cup: false, total_amount: amount, pay_amount: amount }
    }

    pub fn with_cup(mut self) -> Self {
        self.has_cup = true;
        self
    }

    pub fn with_pay_amount(mut self, pay_amount: Money) -> Self {
        self.pay_amount = pay_amount;
        self
    }
}

//-------------------------------------- PaymentNotification ---------------------------------------------------------
/// The payment-provider callback payload, as delivered by the provider-facing transport.
///
/// The `signature` field must be present and non-empty before the payload may be trusted;
/// cryptographic verification itself is delegated to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub order_no: OrderNo,
    pub channel_order_no: String,
    pub amount: Money,
    pub status: CallbackStatus,
    pub paid_at: DateTime<Utc>,
    pub signature: String,
}

//--------------------------------------   MaterialSilo    -----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MaterialSilo {
    pub id: i64,
    pub machine_id: i64,
    /// Slot position, unique per machine.
    pub silo_number: i64,
    pub product_id: Option<i64>,
    pub stock: i64,
    pub max_capacity: i64,
    pub sale_status: SaleStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     Machine       -----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    /// The machine owner entitled to privileged mutations. Actor identity comes from the external
    /// auth layer; the engine only compares ids.
    pub owner_id: i64,
    pub name: String,
    /// Reference handed to the device availability checker.
    pub device_code: String,
    pub business_status: BusinessStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Member       -----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub nickname: String,
    pub mobile: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     Product       -----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_status_machine_is_forward_only() {
        use PaymentStatus::*;
        let all = [WaitPay, Paid, Invalid, Refunded];
        for from in all {
            for to in all {
                let legal = matches!((from, to), (WaitPay, Paid) | (WaitPay, Invalid) | (Paid, Refunded));
                assert_eq!(from.can_transition_to(to), legal, "{from} -> {to}");
            }
        }
        assert!(!WaitPay.can_transition_to(Refunded), "WaitPay may never jump straight to Refunded");
        assert!(Invalid.is_terminal());
        assert!(Refunded.is_terminal());
        assert!(!WaitPay.is_terminal());
        assert!(!Paid.is_terminal());
    }

    #[test]
    fn make_status_machine_is_forward_only() {
        use MakeStatus::*;
        let all = [WaitMake, Making, Made, MakeFail];
        for from in all {
            for to in all {
                let legal = matches!((from, to), (WaitMake, Making) | (Making, Made) | (Making, MakeFail));
                assert_eq!(from.can_transition_to(to), legal, "{from} -> {to}");
            }
        }
        assert!(Made.is_terminal());
        assert!(MakeFail.is_terminal());
    }

    #[test]
    fn status_strings_round_trip() {
        for s in [PaymentStatus::WaitPay, PaymentStatus::Paid, PaymentStatus::Invalid, PaymentStatus::Refunded] {
            assert_eq!(s.to_string().parse::<PaymentStatus>().unwrap(), s);
        }
        for s in [MakeStatus::WaitMake, MakeStatus::Making, MakeStatus::Made, MakeStatus::MakeFail] {
            assert_eq!(s.to_string().parse::<MakeStatus>().unwrap(), s);
        }
        assert!("Pending".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn offline_is_not_a_business_status() {
        assert!("Offline".parse::<BusinessStatus>().is_err());
        assert_eq!(MachineStatus::from(BusinessStatus::Open), MachineStatus::Open);
        assert_eq!(MachineStatus::from(BusinessStatus::Close), MachineStatus::Close);
    }
}
