use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::db_types::OrderNo;

pub const DEFAULT_ORDER_PREFIX: &str = "VM";

/// Issues globally unique, human-diagnosable order numbers of the form
/// `<prefix><yyyymmddHHMMSS><mmm>`.
///
/// The generator keeps a high-water mark over the millisecond clock, so numbers are strictly
/// increasing even when several orders land in the same millisecond or the clock steps backwards.
/// The unique constraint on the orders table backs this up across processes.
#[derive(Debug)]
pub struct OrderNumberGenerator {
    prefix: String,
    last_stamp: AtomicI64,
}

impl Default for OrderNumberGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER_PREFIX)
    }
}

impl OrderNumberGenerator {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self { prefix: prefix.into(), last_stamp: AtomicI64::new(0) }
    }

    pub fn next(&self) -> OrderNo {
        let now = Utc::now().timestamp_millis();
        let mut stamp = now;
        let _ = self.last_stamp.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            stamp = now.max(last + 1);
            Some(stamp)
        });
        let ts = DateTime::<Utc>::from_timestamp_millis(stamp).unwrap_or_else(Utc::now);
        OrderNo(format!("{}{}{:03}", self.prefix, ts.format("%Y%m%d%H%M%S"), stamp.rem_euclid(1000)))
    }
}
