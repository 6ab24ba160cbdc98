use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::AppError;
use crate::store::DebtStore;

/// Periodically rewrites past-due pending debts to `overdue`.
/// Off unless `OVERDUE_SWEEP_SECS` is set.
pub struct OverdueSweeper {
    store: Arc<Mutex<DebtStore>>,
    interval: Duration,
}

impl OverdueSweeper {
    pub fn new(store: Arc<Mutex<DebtStore>>, interval_secs: u64) -> Self {
        Self {
            store,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn start(self) {
        info!("Starting overdue sweeper (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.run_once().await {
                Ok(0) => {}
                Ok(promoted) => info!("Overdue sweep promoted {} debts", promoted),
                // a failed pass does not stop the loop
                Err(e) => warn!("Overdue sweep failed: {:?}", e),
            }
        }
    }

    pub async fn run_once(&self) -> Result<usize, AppError> {
        let mut store = self.store.lock().await;
        store.promote_overdue(Utc::now()).await
    }
}
