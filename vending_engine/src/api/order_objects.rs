use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vmc_common::Money;

use crate::{
    db_types::{MakeStatus, OrderNo, PaymentStatus},
    traits::StoreError,
};

/// A purchase request, as assembled by the client-facing layer from the member's selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub member_id: i64,
    pub machine_id: i64,
    pub product_id: i64,
    pub has_cup: bool,
    /// The amount the member will be charged. May be below the product price (discounts), never
    /// above it and never zero.
    pub pay_amount: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_no: Option<OrderNo>,
    pub member_id: Option<i64>,
    pub machine_id: Option<i64>,
    pub payment_status: Option<Vec<PaymentStatus>>,
    pub make_status: Option<Vec<MakeStatus>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_order_no(mut self, order_no: OrderNo) -> Self {
        self.order_no = Some(order_no);
        self
    }

    pub fn with_member_id(mut self, member_id: i64) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn with_machine_id(mut self, machine_id: i64) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_make_status(mut self, status: MakeStatus) -> Self {
        self.make_status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since<T>(mut self, since: T) -> Result<Self, StoreError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| StoreError::QueryError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, StoreError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| StoreError::QueryError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.order_no.is_none() &&
            self.member_id.is_none() &&
            self.machine_id.is_none() &&
            self.payment_status.is_none() &&
            self.make_status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(order_no) = &self.order_no {
            write!(f, "order_no: {order_no}. ")?;
        }
        if let Some(member_id) = self.member_id {
            write!(f, "member: {member_id}. ")?;
        }
        if let Some(machine_id) = self.machine_id {
            write!(f, "machine: {machine_id}. ")?;
        }
        if let Some(statuses) = &self.payment_status {
            let s = statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            write!(f, "payment_status in [{s}]. ")?;
        }
        if let Some(statuses) = &self.make_status {
            let s = statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            write!(f, "make_status in [{s}]. ")?;
        }
        if let Some(since) = self.since {
            write!(f, "since: {since}. ")?;
        }
        if let Some(until) = self.until {
            write!(f, "until: {until}. ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_filter_reports_itself() {
        let filter = OrderQueryFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "No filters.");
    }

    #[test]
    fn builders_compose() {
        let filter = OrderQueryFilter::default()
            .with_machine_id(3)
            .with_payment_status(PaymentStatus::Paid)
            .with_payment_status(PaymentStatus::Refunded);
        assert!(!filter.is_empty());
        assert_eq!(filter.machine_id, Some(3));
        assert_eq!(filter.payment_status.as_ref().map(Vec::len), Some(2));
    }
}
