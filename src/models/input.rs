use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::models::{DebtStatus, parse_due_date};

/// Form state submitted for "add" and "update".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtInput {
    #[serde(deserialize_with = "deserialize_amount_text")]
    pub amount: String,
    pub description: String,
    pub due_date: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// A `DebtInput` that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDebt {
    pub amount: Decimal,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: DebtStatus,
}

impl DebtInput {
    pub fn new(amount: &str, description: &str, due_date: &str, status: DebtStatus) -> Self {
        Self {
            amount: amount.to_string(),
            description: description.to_string(),
            due_date: due_date.to_string(),
            status: Some(status.as_str().to_string()),
        }
    }

    pub fn validate(&self) -> Result<ValidDebt, AppError> {
        let amount = parse_amount(&self.amount)?;

        let description = self.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("description is required".to_string()));
        }

        if self.due_date.trim().is_empty() {
            return Err(AppError::Validation("due date is required".to_string()));
        }
        let due_date = parse_due_date(&self.due_date)
            .ok_or_else(|| AppError::Validation(format!("invalid due date '{}'", self.due_date)))?;

        let status = match self.status.as_deref() {
            Some(raw) if !raw.trim().is_empty() => DebtStatus::from_str(raw)?,
            _ => DebtStatus::Pending,
        };

        Ok(ValidDebt {
            amount,
            description: description.to_string(),
            due_date,
            status,
        })
    }
}

/// Largest accepted amount. Far below `Decimal::MAX`, so sums over any
/// realistic collection stay representable.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Amounts must be finite, strictly positive and at most `MAX_AMOUNT`.
pub fn parse_amount(raw: &str) -> Result<Decimal, AppError> {
    let raw = raw.trim();
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| AppError::Validation(format!("amount '{}' is not a number", raw)))?;
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("amount must be greater than zero".to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(AppError::Validation(format!("amount must not exceed {}", MAX_AMOUNT)));
    }
    Ok(amount)
}

fn deserialize_amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawAmount::deserialize(deserializer)? {
        RawAmount::Text(s) => s,
        RawAmount::Number(n) => n.to_string(),
    })
}
