//! Endless terrain streaming around a moving viewer.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::chunk::{Chunk, ChunkHandle, ChunkKey, ChunkState};
use crate::pipeline::{ChunkRequest, DrainStats, GenerationPipeline};

/// Streaming parameters for a [`ChunkGrid`].
#[derive(Clone, Copy, Debug)]
pub struct GridSettings {
    /// World size (and heightmap edge length) of one chunk.
    pub chunk_size: u32,
    /// How far the viewer can see, in world units.
    pub render_distance: f32,
    /// Noise scale for heightfield generation.
    pub noise_scale: f32,
    /// Vertical scale for triangulation.
    pub height_multiplier: f32,
    /// Mesh simplification level for every grid chunk.
    pub lod: u32,
    /// Resident-chunk budget. When set, least-recently-visible chunks
    /// beyond the budget are evicted after each update; `None` retains
    /// every chunk ever created.
    pub max_resident: Option<usize>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            render_distance: 64.0,
            noise_scale: 0.3,
            height_multiplier: 10.0,
            lod: 0,
            max_resident: Some(512),
        }
    }
}

/// Called for each chunk released by the eviction pass, with its key and
/// the chunk itself (mesh buffers still attached, ready to be released).
pub type EvictionHook = Box<dyn FnMut(ChunkKey, Chunk) + Send>;

/// Streams fixed-size chunks around the viewer.
///
/// Call [`update`](Self::update) once per tick with the viewer position,
/// then drain the pipeline. Chunks visible last tick are all hidden first
/// and only those re-confirmed in range stay visible, so the visible set is
/// rebuilt every tick from scratch.
pub struct ChunkGrid {
    settings: GridSettings,
    pipeline: GenerationPipeline,
    chunks: FxHashMap<ChunkKey, ChunkHandle>,
    visible_last_update: Vec<ChunkKey>,
    eviction_hook: Option<EvictionHook>,
    tick: u64,
}

impl ChunkGrid {
    pub fn new(settings: GridSettings, pipeline: GenerationPipeline) -> Self {
        Self {
            settings,
            pipeline,
            chunks: FxHashMap::default(),
            visible_last_update: Vec::new(),
            eviction_hook: None,
            tick: 0,
        }
    }

    /// Install a hook observing each evicted chunk.
    pub fn set_eviction_hook(&mut self, hook: EvictionHook) {
        self.eviction_hook = Some(hook);
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// Number of chunks the render distance spans, rounded.
    pub fn visible_radius(&self) -> i32 {
        (self.settings.render_distance / self.settings.chunk_size as f32).round() as i32
    }

    /// Keys confirmed visible by the most recent update, in scan order.
    pub fn visible_keys(&self) -> &[ChunkKey] {
        &self.visible_last_update
    }

    pub fn visible_count(&self) -> usize {
        self.visible_last_update.len()
    }

    /// All resident chunks, visible or not.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk(&self, key: ChunkKey) -> Option<&ChunkHandle> {
        self.chunks.get(&key)
    }

    /// Iterate over all resident chunks, visible or not.
    pub fn chunks(&self) -> impl Iterator<Item = (ChunkKey, &ChunkHandle)> {
        self.chunks.iter().map(|(key, handle)| (*key, handle))
    }

    /// Drain the generation pipeline, applying finished results to chunks.
    pub fn drain(&self) -> DrainStats {
        self.pipeline.drain()
    }

    /// Rebuild the visible set for the current viewer position, creating
    /// and requesting chunks that enter the window for the first time.
    ///
    /// The scan window spans offsets `[-visible_radius/2, visible_radius/2]`
    /// per axis around the viewer's chunk, inclusive at both ends. That is
    /// half the span the radius suggests; kept as-is for parity with the
    /// behaviour this streamer replicates.
    pub fn update(&mut self, viewer: Vec3) {
        self.tick += 1;

        for key in self.visible_last_update.drain(..) {
            if let Some(chunk) = self.chunks.get(&key) {
                chunk
                    .lock()
                    .expect("chunk lock poisoned")
                    .set_visible(false);
            }
        }

        let viewer_chunk = ChunkKey::containing(viewer, self.settings.chunk_size);
        let half = self.visible_radius() / 2;
        let mut visible = Vec::new();

        for dx in -half..=half {
            for dz in -half..=half {
                let key = ChunkKey::new(viewer_chunk.x + dx, viewer_chunk.z + dz);
                if let Some(chunk) = self.chunks.get(&key) {
                    let mut chunk = chunk.lock().expect("chunk lock poisoned");
                    if chunk.update_visibility(viewer, self.settings.render_distance) {
                        chunk.last_visible_tick = self.tick;
                        visible.push(key);
                    }
                } else {
                    let handle = self.spawn_chunk(key);
                    {
                        // Optimistically visible before any data arrives.
                        let mut chunk = handle.lock().expect("chunk lock poisoned");
                        chunk.set_visible(true);
                        chunk.last_visible_tick = self.tick;
                    }
                    self.chunks.insert(key, handle);
                    visible.push(key);
                }
            }
        }

        self.visible_last_update = visible;
        self.evict_over_budget();
    }

    fn spawn_chunk(&self, key: ChunkKey) -> ChunkHandle {
        let handle: ChunkHandle = Arc::new(Mutex::new(Chunk::new(
            key,
            self.settings.chunk_size,
            self.settings.lod,
        )));
        self.pipeline.request_chunk(
            &handle,
            ChunkRequest {
                size: self.settings.chunk_size,
                noise_scale: self.settings.noise_scale,
                height_multiplier: self.settings.height_multiplier,
                lod: self.settings.lod,
            },
        );
        handle
    }

    /// Evict least-recently-visible chunks beyond the resident budget.
    ///
    /// Only invisible chunks in a terminal state are candidates; a chunk
    /// whose generation results are still in flight keeps its handle until
    /// a later tick.
    fn evict_over_budget(&mut self) {
        let Some(max_resident) = self.settings.max_resident else {
            return;
        };
        if self.chunks.len() <= max_resident {
            return;
        }

        let mut candidates: Vec<(u64, ChunkKey)> = Vec::new();
        for (key, handle) in &self.chunks {
            let chunk = handle.lock().expect("chunk lock poisoned");
            let terminal = matches!(chunk.state(), ChunkState::MeshReady | ChunkState::Failed);
            if !chunk.is_visible() && terminal {
                candidates.push((chunk.last_visible_tick, *key));
            }
        }
        candidates.sort_unstable();

        let excess = self.chunks.len() - max_resident;
        let mut evicted = 0_usize;
        for (_, key) in candidates.into_iter().take(excess) {
            let Some(handle) = self.chunks.remove(&key) else {
                continue;
            };
            match Arc::try_unwrap(handle) {
                Ok(mutex) => {
                    let chunk = mutex.into_inner().expect("chunk lock poisoned");
                    evicted += 1;
                    if let Some(hook) = self.eviction_hook.as_mut() {
                        hook(key, chunk);
                    }
                }
                Err(handle) => {
                    // A drained-but-unapplied callback still holds a clone;
                    // keep the chunk resident until it settles.
                    self.chunks.insert(key, handle);
                }
            }
        }
        if evicted > 0 {
            debug!(evicted, resident = self.chunks.len(), "evicted chunks");
        }
    }
}
