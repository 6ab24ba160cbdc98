use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::PersistenceError;
use crate::models::DebtRecord;
use crate::storage::SlotStore;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    records: &'a [DebtRecord],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    records: Vec<DebtRecord>,
}

/// Either the versioned envelope or the bare array written before
/// versioning existed.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPayload {
    Versioned(Snapshot),
    Legacy(Vec<DebtRecord>),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

pub fn encode(records: &[DebtRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SnapshotRef {
        version: SCHEMA_VERSION,
        records,
    })
}

pub fn decode(raw: &str) -> Result<Vec<DebtRecord>, DecodeError> {
    let records = match serde_json::from_str::<StoredPayload>(raw)? {
        StoredPayload::Versioned(snapshot) if snapshot.version > SCHEMA_VERSION => {
            return Err(DecodeError::UnsupportedVersion {
                found: snapshot.version,
                supported: SCHEMA_VERSION,
            });
        }
        StoredPayload::Versioned(snapshot) => snapshot.records,
        StoredPayload::Legacy(records) => records,
    };
    Ok(dedup_ids(records))
}

fn dedup_ids(records: Vec<DebtRecord>) -> Vec<DebtRecord> {
    let mut seen = HashSet::new();
    let before = records.len();
    let unique: Vec<DebtRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if unique.len() != before {
        warn!("dropped {} stored debts with duplicate ids", before - unique.len());
    }
    unique
}

/// Reads and writes the whole collection as one named slot.
#[derive(Clone)]
pub struct DebtPersistence {
    slots: Arc<dyn SlotStore>,
    key: String,
}

impl DebtPersistence {
    pub fn new(slots: Arc<dyn SlotStore>, key: impl Into<String>) -> Self {
        Self {
            slots,
            key: key.into(),
        }
    }

    /// Never fails: a missing, unreadable or undecodable slot is an empty
    /// collection.
    pub async fn load(&self) -> Vec<DebtRecord> {
        let raw = match self.slots.read(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored debts under '{}'", self.key);
                return Vec::new();
            }
            Err(e) => {
                warn!("failed to read debts from '{}': {}", self.key, e);
                return Vec::new();
            }
        };

        match decode(&raw) {
            Ok(records) => {
                debug!("loaded {} debts from '{}'", records.len(), self.key);
                records
            }
            Err(e) => {
                warn!("discarding unreadable debts in '{}': {}", self.key, e);
                Vec::new()
            }
        }
    }

    pub async fn save(&self, records: &[DebtRecord]) -> Result<(), PersistenceError> {
        let payload = encode(records)?;
        self.slots.write(&self.key, &payload).await.inspect_err(|e| {
            error!("failed to save {} debts to '{}': {}", records.len(), self.key, e);
        })
    }
}
