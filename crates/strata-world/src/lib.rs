//! Terrain streaming: chunk bookkeeping, the two-stage async generation
//! pipeline, endless grid streaming around a viewer, and adaptive quadtree
//! subdivision.
//!
//! The host engine drives this crate from its update tick: feed it the
//! viewer position each frame, call [`GenerationPipeline::drain`] to apply
//! finished results on the main thread, and read finished chunks
//! (colour buffer + mesh buffers + bounds + visibility) off the handles.

mod chunk;
mod endless;
mod pipeline;
mod quadtree;

pub use chunk::{Chunk, ChunkHandle, ChunkKey, ChunkState};
pub use endless::{ChunkGrid, EvictionHook, GridSettings};
pub use pipeline::{
    ChunkRequest, DrainStats, GenerationPipeline, HeightfieldResult, MeshResult, PipelineError,
};
pub use quadtree::{LeafChunk, QuadtreeSettings, TerrainQuadTree};
