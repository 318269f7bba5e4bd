//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Per-chunk generation settings.
    pub terrain: TerrainSection,
    /// Endless streaming settings.
    pub streaming: StreamingSection,
    /// Adaptive quadtree settings.
    pub quadtree: QuadtreeSection,
    /// Debug/development settings.
    pub debug: DebugSection,
}

/// Per-chunk terrain generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainSection {
    /// Chunk edge length in world units (and heightmap cells).
    pub chunk_size: u32,
    /// Noise scale; clamped to [0.001, 1.0] by the sampler.
    pub noise_scale: f32,
    /// Vertical exaggeration applied to heights during meshing.
    pub height_multiplier: f32,
    /// Mesh simplification level for grid chunks (0 = full resolution).
    pub lod: u32,
    /// World seed for deterministic generation.
    pub seed: u32,
}

/// Endless streaming settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingSection {
    /// How far the viewer can see, in world units.
    pub render_distance: f32,
    /// Background worker threads (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Resident-chunk budget for the eviction pass (0 = retain forever).
    pub max_resident_chunks: usize,
}

/// Adaptive quadtree settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuadtreeSection {
    /// Edge length of the root region.
    pub root_chunk_size: u32,
    /// LOD of the root chunk; halves with each subdivision level.
    pub root_lod: u32,
    /// Nodes at or below this size never subdivide.
    pub min_chunk_size: u32,
    /// Subdivision threshold as a fraction of the root size.
    pub distance_threshold_factor: f32,
}

/// Debug/development settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugSection {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for TerrainSection {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            noise_scale: 0.3,
            height_multiplier: 10.0,
            lod: 0,
            seed: 0,
        }
    }
}

impl Default for StreamingSection {
    fn default() -> Self {
        Self {
            render_distance: 64.0,
            worker_threads: 0,
            max_resident_chunks: 512,
        }
    }
}

impl Default for QuadtreeSection {
    fn default() -> Self {
        Self {
            root_chunk_size: 64,
            root_lod: 8,
            min_chunk_size: 2,
            distance_threshold_factor: 0.75,
        }
    }
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let config = Self::read_from(&path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: config_dir.join(CONFIG_FILE),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_err)?;

        let pretty = ron::ser::PrettyConfig::new().depth_limit(3);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(write_err)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read_from(&config_dir.join(CONFIG_FILE))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
