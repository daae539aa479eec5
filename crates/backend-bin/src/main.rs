use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use coachcall_backend_lib::{
    accounts::{AccountStore, InMemoryAccountStore},
    config::Settings,
    ledger::FlatFileLedger,
    ws_router, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;

    // Initialize tracing; RUST_LOG overrides the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    let ledger =
        FlatFileLedger::new(&settings.data_dir).context("initializing session ledger")?;

    let accounts: Arc<dyn AccountStore> = match &settings.accounts_file {
        Some(path) => Arc::new(
            InMemoryAccountStore::load_from(path)
                .await
                .with_context(|| format!("loading accounts from {}", path.display()))?,
        ),
        None => {
            tracing::warn!("no accounts file configured; starting with an empty account store");
            Arc::new(InMemoryAccountStore::new())
        },
    };

    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(accounts, ledger, settings));
    let app = ws_router::create_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
