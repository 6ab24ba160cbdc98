use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debtbook::api::router;
use debtbook::config::AppConfig;
use debtbook::persistence::DebtPersistence;
use debtbook::services::OverdueSweeper;
use debtbook::state::AppState;
use debtbook::storage::{SlotStore, SqliteSlotStore};
use debtbook::store::DebtStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debtbook=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let slots: Arc<dyn SlotStore> = Arc::new(SqliteSlotStore::connect(&config.database_url).await?);
    let persistence = DebtPersistence::new(slots.clone(), config.storage_key.clone());
    let store = DebtStore::open(persistence).await;

    let addr = config.bind_addr;
    let sweep_secs = config.overdue_sweep_secs;
    let state = AppState::new(store, slots, config);

    if sweep_secs > 0 {
        let sweeper = OverdueSweeper::new(state.store.clone(), sweep_secs);
        tokio::spawn(sweeper.start());
    } else {
        info!("overdue sweeper disabled; 'overdue' status is only set explicitly");
    }

    let app = router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
