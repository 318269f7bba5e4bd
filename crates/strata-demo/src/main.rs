//! Headless demo driving the terrain streaming core.
//!
//! Loads `config.ron` (CLI-overridable), initializes logging, then runs two
//! passes: an endless-grid walk with a wandering viewer, and an adaptive
//! quadtree subdivision around a fixed viewer. No graphics: the demo
//! consumes the core exactly as a host engine would, one update per tick.
//!
//! Run with `cargo run -p strata-demo -- --ticks 120 --render-distance 96`.

mod demos;

use std::path::PathBuf;

use clap::Parser;
use strata_config::{CliArgs, Config};
use tracing::info;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata")
    });
    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {err}; using defaults");
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);

    strata_log::init_logging(Some(&config));
    info!(config_dir = %config_dir.display(), "strata demo starting");

    let ticks = args.ticks.unwrap_or(60);
    demos::run_endless_walk(&config, ticks);
    demos::run_quadtree_pass(&config);
}
