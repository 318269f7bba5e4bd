//! Heightmap triangulation with LOD-dependent simplification.
//!
//! Converts a heightmap plus a height multiplier and LOD level into plain
//! vertex/UV/index buffers. Higher LOD levels sample the source grid with a
//! larger stride, producing coarser meshes; LOD 0 is full resolution.

mod buffers;
mod triangulate;

pub use buffers::MeshBuffers;
pub use triangulate::{MeshError, lod_step, sampled_span, triangulate, validate};
