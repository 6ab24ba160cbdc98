use chrono::{DateTime, Datelike, Months, Utc};
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{DebtInput, DebtRecord, DebtStatus, RecordId};
use crate::persistence::DebtPersistence;

/// Owns the debt collection. Every successful mutation is flushed to the
/// persistence slot before returning; a failed flush leaves the mutation in
/// memory and surfaces `AppError::Persistence`.
pub struct DebtStore {
    records: Vec<DebtRecord>,
    persistence: DebtPersistence,
}

/// Result of duplicating one month into the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplication {
    pub created: usize,
    pub target_year: i32,
    pub target_month: u32,
}

impl DebtStore {
    pub async fn open(persistence: DebtPersistence) -> Self {
        let records = persistence.load().await;
        info!("debt store opened with {} records", records.len());
        Self { records, persistence }
    }

    pub fn records(&self) -> &[DebtRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Result<&DebtRecord, AppError> {
        self.records
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| AppError::NotFound(id.clone()))
    }

    pub async fn add(&mut self, input: &DebtInput) -> Result<RecordId, AppError> {
        let valid = input.validate()?;
        let id = self.next_id();
        self.records.push(DebtRecord {
            id: id.clone(),
            amount: valid.amount,
            description: valid.description,
            due_date: valid.due_date,
            status: valid.status,
            created_at: Utc::now(),
            updated_at: None,
        });
        info!("added debt {}", id);

        self.flush().await?;
        Ok(id)
    }

    pub async fn update(&mut self, id: &RecordId, input: &DebtInput) -> Result<(), AppError> {
        let index = self.position(id)?;
        let valid = input.validate()?;

        let record = &mut self.records[index];
        record.amount = valid.amount;
        record.description = valid.description;
        record.due_date = valid.due_date;
        record.status = valid.status;
        record.updated_at = Some(Utc::now());
        info!("updated debt {}", id);

        self.flush().await
    }

    pub async fn set_status(&mut self, id: &RecordId, status: DebtStatus) -> Result<(), AppError> {
        let index = self.position(id)?;

        let record = &mut self.records[index];
        record.status = status;
        record.updated_at = Some(Utc::now());
        info!("debt {} marked {}", id, status);

        self.flush().await
    }

    pub async fn delete(&mut self, id: &RecordId) -> Result<(), AppError> {
        let index = self.position(id)?;
        self.records.remove(index);
        info!("deleted debt {}", id);

        self.flush().await
    }

    pub async fn clear(&mut self) -> Result<(), AppError> {
        let removed = self.records.len();
        self.records.clear();
        info!("cleared {} debts", removed);

        self.flush().await
    }

    /// Copies every debt due in the calendar month of `reference` into the
    /// following month as a new pending debt.
    ///
    /// The day of month is kept; when the next month is shorter the copy
    /// lands on that month's last day (Jan 31 becomes Feb 28/29). Apart from
    /// id, due date and status, the copy keeps every field of its source.
    pub async fn duplicate_current_period(
        &mut self,
        reference: DateTime<Utc>,
    ) -> Result<Duplication, AppError> {
        let target = reference
            .checked_add_months(Months::new(1))
            .ok_or_else(|| AppError::Validation("reference date is out of range".to_string()))?;

        let mut copies = Vec::new();
        for source in self
            .records
            .iter()
            .filter(|r| r.due_date.year() == reference.year() && r.due_date.month() == reference.month())
        {
            let due_date = source.due_date.checked_add_months(Months::new(1)).ok_or_else(|| {
                AppError::Validation(format!("due date of debt {} is out of range", source.id))
            })?;
            copies.push(DebtRecord {
                due_date,
                status: DebtStatus::Pending,
                ..source.clone()
            });
        }

        let duplication = Duplication {
            created: copies.len(),
            target_year: target.year(),
            target_month: target.month(),
        };
        if copies.is_empty() {
            warn!(
                "no debts due in {}-{:02} to duplicate",
                reference.year(),
                reference.month()
            );
            return Ok(duplication);
        }

        for mut copy in copies {
            copy.id = self.next_id();
            self.records.push(copy);
        }
        info!(
            "duplicated {} debts into {}-{:02}",
            duplication.created, duplication.target_year, duplication.target_month
        );

        self.flush().await?;
        Ok(duplication)
    }

    /// Marks every pending debt whose due date is strictly before `now` as
    /// `overdue`. Returns how many changed; nothing is written when none did.
    pub async fn promote_overdue(&mut self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut promoted = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.status == DebtStatus::Pending && r.due_date < now)
        {
            record.status = DebtStatus::Overdue;
            record.updated_at = Some(now);
            promoted += 1;
        }

        if promoted > 0 {
            info!("promoted {} debts to overdue", promoted);
            self.flush().await?;
        }
        Ok(promoted)
    }

    fn position(&self, id: &RecordId) -> Result<usize, AppError> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| AppError::NotFound(id.clone()))
    }

    fn next_id(&self) -> RecordId {
        loop {
            let id = RecordId::generate();
            if !self.records.iter().any(|r| r.id == id) {
                return id;
            }
        }
    }

    async fn flush(&self) -> Result<(), AppError> {
        self.persistence.save(&self.records).await?;
        Ok(())
    }
}
