pub use config::Config;
use config::{Environment, File};
use once_cell::sync::OnceCell;
use std::error::Error;

static GLOBAL_CONFIG: OnceCell<Config> = OnceCell::new();

/// Layered configuration: built-in defaults, then an optional config file,
/// then `ORBGRAPH_*` environment overrides (double underscore separates
/// nesting, e.g. `ORBGRAPH_ENGINE__GRAPH_SIZE_LIMIT=10000`).
pub fn load_config(path: &str) -> Result<Config, Box<dyn Error>> {
    let config = Config::builder()
        .set_default("server.bind", "0.0.0.0:9000")?
        .set_default("paths.db_path", "./data/orbgraph")?
        .set_default("engine.graph_size_limit", 5000i64)?
        .set_default("engine.dfs_iteration_guard", true)?
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::with_prefix("ORBGRAPH").separator("__"))
        .build()?;
    Ok(config)
}

pub fn init_global_config(path: &str) -> Result<(), Box<dyn Error>> {
    let config = load_config(path)?;
    GLOBAL_CONFIG.set(config).map_err(|_| "Config already set")?;
    Ok(())
}

pub fn get_global_config() -> &'static Config {
    GLOBAL_CONFIG.get().unwrap_or_else(|| {
        eprintln!("FATAL: Config not initialized - call init_global_config() first");
        std::process::exit(1);
    })
}
