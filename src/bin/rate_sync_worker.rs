use std::sync::Arc;

use clap::{Arg, ArgAction, Command};
use pmis_backend::{
    billing::{HttpRateProvider, RateSyncScheduler, rate_sync::sync_once},
    config::Config,
    db, init_tracing,
};

/// Standalone exchange-rate synchronization, for deployments that keep the
/// scheduler out of the API process.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("rate_sync_worker")
        .about("Fetches exchange rates and stores them")
        .arg(
            Arg::new("once")
                .long("once")
                .action(ArgAction::SetTrue)
                .help("Run a single sync and exit"),
        )
        .arg(Arg::new("base").long("base").help("Override the base currency"))
        .get_matches();

    let config = Config::from_env()?;
    init_tracing(&config);

    let mut rates = config.exchange_rates();
    if let Some(base) = matches.get_one::<String>("base") {
        rates.base_currency = base.trim().to_ascii_uppercase();
    }

    let pool = db::create_pool(&config.database())?;
    let provider = Arc::new(HttpRateProvider::new(rates.api_url.clone()));

    if matches.get_flag("once") {
        let result = sync_once(&pool, provider.as_ref(), &rates.base_currency).await?;
        tracing::info!(base = %result.base_currency, updated = result.updated, "Sync finished");
        return Ok(());
    }

    RateSyncScheduler::new(pool, provider, rates).run().await;
    Ok(())
}
