//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terrain engine command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "strata", about = "Strata terrain engine")]
pub struct CliArgs {
    /// Chunk edge length in world units.
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Render distance in world units.
    #[arg(long)]
    pub render_distance: Option<f32>,

    /// Mesh simplification level for grid chunks.
    #[arg(long)]
    pub lod: Option<u32>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Background worker threads (0 = derive from CPU count).
    #[arg(long)]
    pub worker_threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Simulation ticks to run in the demo harness.
    #[arg(long)]
    pub ticks: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(cs) = args.chunk_size {
            self.terrain.chunk_size = cs;
        }
        if let Some(rd) = args.render_distance {
            self.streaming.render_distance = rd;
        }
        if let Some(lod) = args.lod {
            self.terrain.lod = lod;
        }
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if let Some(threads) = args.worker_threads {
            self.streaming.worker_threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
