//! Configuration for the terrain engine.
//!
//! Runtime-configurable settings persisted to disk as RON, with CLI
//! overrides via clap and hot-reload detection.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE, Config, DebugSection, QuadtreeSection, StreamingSection, TerrainSection,
};
pub use error::ConfigError;
