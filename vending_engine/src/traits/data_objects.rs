use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vmc_common::Money;

use crate::db_types::{Order, OrderNo, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMachine {
    pub owner_id: i64,
    pub name: String,
    pub device_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSilo {
    pub machine_id: i64,
    pub silo_number: i64,
    pub max_capacity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub nickname: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
}

//--------------------------------------   RefundResult    -----------------------------------------------------------
/// The outcome of a successful refund. The monetary movement back to the member is executed by
/// the payment-provider integration outside the engine; this records what the engine committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResult {
    pub order: Order,
    pub refund_amount: Money,
    pub refund_time: DateTime<Utc>,
}

//--------------------------------------    CallbackAck    -----------------------------------------------------------
/// Acknowledgement returned to the payment provider for a callback delivery.
///
/// Except for a missing signature, callbacks are *always* acknowledged — including for unknown
/// orders and internal failures — because a negative acknowledgement only buys an unbounded
/// provider retry storm. The outcome records what actually happened for logging and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackAck {
    pub order_no: OrderNo,
    pub outcome: ReconcileOutcome,
}

impl CallbackAck {
    pub fn new(order_no: OrderNo, outcome: ReconcileOutcome) -> Self {
        Self { order_no, outcome }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// The callback won the WaitPay guard and the order is now Paid.
    Paid(Order),
    /// A non-success provider status moved the order to Invalid.
    Invalidated(Order),
    /// The order had already left WaitPay; nothing was mutated.
    AlreadyProcessed(PaymentStatus),
    /// No order with this number exists. Logged and acknowledged.
    UnknownOrder,
    /// The reported amount does not match the order. Nothing was mutated; an operator must look.
    AmountMismatch { expected: Money, reported: Money },
    /// An internal failure was logged and swallowed at the acknowledgement boundary.
    Deferred,
}
