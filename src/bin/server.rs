use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use metric_store::{
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, read_config_file},
    storage::Store,
};
use tracing::{error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,

    /// Address to serve the API on
    #[arg(short, long, env = "ADDRESS")]
    address: Option<SocketAddr>,

    /// Database connection URL (postgres://... or sqlite:...)
    #[arg(short, long, env = "DATABASE_DSN")]
    database_dsn: Option<String>,
}

fn log_filter() -> filter::Targets {
    filter::Targets::new().with_targets(vec![
        ("metric_store", LevelFilter::DEBUG),
        (module_path!(), LevelFilter::TRACE),
        ("tower_http", LevelFilter::DEBUG),
    ])
}

fn init() {
    let filter = log_filter();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };
    let config = config.resolve(args.address, args.database_dsn)?;

    let store = Arc::new(Store::connect(&config.storage).await?);
    info!("using {}", store.describe().await);

    let state = ApiState::new(store.clone());
    let addr = spawn_api_server(
        ApiConfig {
            bind_addr: config.address,
        },
        state,
    )
    .await?;
    info!("serving metrics on http://{addr}");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    if let Err(e) = store.close().await {
        error!("failed to close metric store: {e}");
    }

    Ok(())
}
