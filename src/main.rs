use std::sync::Arc;

use clap::Parser;
use tracing::info;

use orbgraph::api::{router, AppState};
use orbgraph::config::{get_global_config, init_global_config};
use orbgraph::metrics::register_metrics;
use orbgraph::store::rocks::RocksBlockStore;
use orbgraph::telemetry::{init_tracing, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(
    name = "orbgraph",
    about = "Address neighborhood graphs and path search over an indexed chain store"
)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Override server.bind from the configuration
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(TelemetryConfig::default())?;
    init_global_config(&args.config)?;
    register_metrics();
    let config = get_global_config();

    let db_path = shellexpand::tilde(&config.get_string("paths.db_path")?).to_string();
    let store = RocksBlockStore::open(&db_path)?;

    let state = AppState {
        store: Arc::new(store),
        graph_size_limit: config.get_int("engine.graph_size_limit")? as usize,
        dfs_iteration_guard: config.get_bool("engine.dfs_iteration_guard")?,
    };

    let bind = match args.bind {
        Some(bind) => bind,
        None => config.get_string("server.bind")?,
    };
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(%bind, %db_path, "orbgraph listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
