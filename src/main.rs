use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use pentest_findings::cache::QueryCache;
use pentest_findings::cli::{self, Cli};
use pentest_findings::config::AppConfig;
use pentest_findings::remote::HttpRemoteStore;
use pentest_findings::telemetry::init_telemetry;
use pentest_findings::workflow::LogNavigator;

#[tokio::main]
async fn main() -> Result<()> {
    AppConfig::load_env_file()?;
    let config = AppConfig::load()?;
    init_telemetry(&config.observability)?;

    let cli = Cli::parse();

    let store = Arc::new(HttpRemoteStore::new(&config.api)?);
    let cache = Arc::new(QueryCache::new(&config.cache));
    let navigator = Arc::new(LogNavigator);

    cli::run(cli.command, store, cache, navigator).await
}
