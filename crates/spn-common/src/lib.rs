//! Shared types and ambient infrastructure (config, logging) for the
//! storage provider node crates.

pub mod config;
pub mod ids;
pub mod log;

pub use config::{ConfigError, NodeConfig};
pub use ids::{Cid, Fid};
pub use log::{init_logging, LogFormat};
