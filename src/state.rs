use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::storage::SlotStore;
use crate::store::DebtStore;
use crate::view::Session;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<DebtStore>>,
    pub session: Arc<Mutex<Session>>,
    pub slots: Arc<dyn SlotStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: DebtStore, slots: Arc<dyn SlotStore>, config: AppConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            session: Arc::new(Mutex::new(Session::default())),
            slots,
            config: Arc::new(config),
        }
    }
}
