//! Pure views over a debt collection. Nothing here mutates records, and
//! every time-dependent view takes `now` explicitly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::models::{DebtRecord, DebtStatus};

pub const DEFAULT_DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DebtStatus),
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => f.write_str(status.as_str()),
        }
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::Validation(format!("unknown sort direction '{}'", other))),
        }
    }
}

/// Sums by status. `overdue` counts the stored `overdue` status, not debts
/// that are merely past due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub total: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub overdue: Decimal,
}

pub fn filter_by_status(records: &[DebtRecord], filter: StatusFilter) -> Vec<&DebtRecord> {
    match filter {
        StatusFilter::All => records.iter().collect(),
        StatusFilter::Only(status) => records.iter().filter(|r| r.status == status).collect(),
    }
}

/// Stable in both directions: equal due dates keep their input order.
pub fn sort_by_due_date(mut records: Vec<&DebtRecord>, direction: SortDirection) -> Vec<&DebtRecord> {
    match direction {
        SortDirection::Asc => records.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
        SortDirection::Desc => records.sort_by(|a, b| b.due_date.cmp(&a.due_date)),
    }
    records
}

/// Pending debts due in `(now, now + horizon_days]`. A horizon past the
/// representable range reaches to the end of time.
pub fn due_soon(records: &[DebtRecord], now: DateTime<Utc>, horizon_days: i64) -> Vec<&DebtRecord> {
    let horizon = TimeDelta::try_days(horizon_days)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    records
        .iter()
        .filter(|r| r.status == DebtStatus::Pending && r.due_date > now && r.due_date <= horizon)
        .collect()
}

/// Pending debts whose due date has passed.
pub fn overdue(records: &[DebtRecord], now: DateTime<Utc>) -> Vec<&DebtRecord> {
    records
        .iter()
        .filter(|r| r.status == DebtStatus::Pending && r.due_date < now)
        .collect()
}

/// Sums saturate at `Decimal::MAX` rather than overflow.
pub fn totals(records: &[DebtRecord]) -> Totals {
    let mut totals = Totals::default();
    for record in records {
        totals.total = totals.total.saturating_add(record.amount);
        let partition = match record.status {
            DebtStatus::Paid => &mut totals.paid,
            DebtStatus::Pending => &mut totals.pending,
            DebtStatus::Overdue => &mut totals.overdue,
        };
        *partition = partition.saturating_add(record.amount);
    }
    debug!(
        "totals recomputed: total={} paid={} pending={} overdue={}",
        totals.total, totals.paid, totals.pending, totals.overdue
    );
    totals
}
