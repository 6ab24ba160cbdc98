pub mod debt;
pub mod input;

pub use debt::{DebtRecord, DebtStatus, RecordId, parse_due_date};
pub use input::{DebtInput, StatusRequest, ValidDebt};
