pub mod api;
pub mod bfs;
pub mod collapse;
pub mod config;
pub mod constants;
pub mod dfs;
pub mod error;
pub mod graph;
pub mod limiter;
pub mod metrics;
pub mod parser;
pub mod paths;
pub mod store;
pub mod telemetry;

pub use error::EngineError;
pub use graph::{Addr, Graph, Tx};
