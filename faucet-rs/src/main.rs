//! faucet-rs: Testnet token faucet server

use faucet_rs::api::{AppState, FaucetServer};
use faucet_rs::ledger::LedgerStore;
use faucet_rs::scheduler::ResetScheduler;
use faucet_rs::{disburse, Clock, FaucetConfig, FaucetService, QuotaEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("faucet.toml"));
    let config = FaucetConfig::load(Some(config_path.as_path()))?;

    init_logging(&config);

    info!("Starting faucet-rs v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {} and environment", config_path.display());
    config.validate()?;

    info!("  Listening on: {}", config.server.listen_addr);
    info!("  Daily limit: {}", config.quota.daily_limit);
    if config.server.admin_token().is_none() {
        info!("  Admin routes disabled (no server.admin_token)");
    }
    info!("  Ledger: {}", config.quota.ledger_path.display());
    info!("  Amount: {}", config.disbursement.coin());

    let clock = Clock::from(config.quota.timezone);

    let store = LedgerStore::new(config.quota.ledger_path.clone());
    let engine = Arc::new(QuotaEngine::open(store, config.quota.daily_limit).await?);

    let disburser = disburse::from_config(&config.disbursement)?;
    let service = Arc::new(FaucetService::from_config(&config, engine.clone(), disburser));

    // Nightly reset
    let scheduler = Arc::new(ResetScheduler::new(engine, clock));
    scheduler.clone().spawn();

    let server = FaucetServer::new(
        AppState {
            service,
            scheduler,
            admin_token: config.server.admin_token().map(str::to_string),
        },
        config.server.listen_addr.clone(),
    );
    server.run().await?;

    Ok(())
}

fn init_logging(config: &FaucetConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("faucet_rs={},tower_http=info", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
