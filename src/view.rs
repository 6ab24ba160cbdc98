use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{DebtRecord, DebtStatus, RecordId};
use crate::query::{self, SortDirection, StatusFilter, Totals};

/// Per-session presentation choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub filter: StatusFilter,
    pub sort: SortDirection,
}

impl Session {
    pub fn toggle_sort(&mut self) -> SortDirection {
        self.sort = self.sort.toggled();
        self.sort
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DebtRow {
    pub id: RecordId,
    pub description: String,
    pub amount: Decimal,
    pub amount_display: String,
    pub due_date: DateTime<Utc>,
    pub due_date_display: String,
    pub status: DebtStatus,
}

impl From<&DebtRecord> for DebtRow {
    fn from(record: &DebtRecord) -> Self {
        Self {
            id: record.id.clone(),
            description: record.description.clone(),
            amount: record.amount,
            amount_display: format_currency(record.amount),
            due_date: record.due_date,
            due_date_display: format_due_date(record.due_date),
            status: record.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsDisplay {
    pub total: String,
    pub paid: String,
    pub pending: String,
    pub overdue: String,
}

impl From<&Totals> for TotalsDisplay {
    fn from(totals: &Totals) -> Self {
        Self {
            total: format_currency(totals.total),
            paid: format_currency(totals.paid),
            pending: format_currency(totals.pending),
            overdue: format_currency(totals.overdue),
        }
    }
}

/// Every derived view, recomputed together from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub session: Session,
    pub debts: Vec<DebtRow>,
    pub totals: Totals,
    pub totals_display: TotalsDisplay,
    pub due_soon: Vec<DebtRow>,
    pub overdue: Vec<DebtRow>,
    pub headline: String,
}

impl Dashboard {
    pub fn compute(
        records: &[DebtRecord],
        session: Session,
        now: DateTime<Utc>,
        due_soon_days: i64,
    ) -> Self {
        let filtered = query::filter_by_status(records, session.filter);
        let listed = query::sort_by_due_date(filtered, session.sort);
        let totals = query::totals(records);

        Self {
            session,
            debts: rows(listed),
            totals_display: TotalsDisplay::from(&totals),
            due_soon: rows(query::due_soon(records, now, due_soon_days)),
            overdue: rows(query::overdue(records, now)),
            headline: format!("Pending: {}", format_currency(totals.pending)),
            totals,
        }
    }
}

fn rows(records: Vec<&DebtRecord>) -> Vec<DebtRow> {
    records.into_iter().map(DebtRow::from).collect()
}

/// `$` followed by the amount rounded to whole units, halves away from zero.
pub fn format_currency(amount: Decimal) -> String {
    let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("${}", whole.normalize())
}

pub fn format_due_date(due_date: DateTime<Utc>) -> String {
    due_date.format("%d/%m/%Y").to_string()
}
