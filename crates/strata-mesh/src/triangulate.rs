//! Heightmap-to-mesh triangulation.

use glam::{Vec2, Vec3};
use strata_heightfield::Heightmap;

use crate::buffers::MeshBuffers;

/// Errors reported synchronously by [`triangulate`] and [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// Fewer than two rows/columns cannot form a triangle.
    #[error("heightmap must be at least 2x2 to form a triangle, got {0}x{0}")]
    HeightmapTooSmall(usize),
    /// The LOD stride skips so many samples that fewer than two vertices
    /// remain per row.
    #[error("lod {lod} leaves fewer than two sampled vertices per row for size {size}")]
    LodTooCoarse { lod: u32, size: usize },
}

/// Sampling stride for a LOD level: full resolution at 0, `2 * lod` above.
pub fn lod_step(lod: u32) -> usize {
    if lod == 0 { 1 } else { (lod * 2) as usize }
}

/// Number of sampled vertices per row/column for a grid edge of `size`
/// walked with `step`.
pub fn sampled_span(size: usize, step: usize) -> usize {
    size.div_ceil(step)
}

/// Check that `(size, lod)` can produce at least one quad.
///
/// Callers dispatching triangulation to worker threads use this to fail
/// fast on the requesting thread instead of deferring the error into the
/// async pipeline.
pub fn validate(size: usize, lod: u32) -> Result<(), MeshError> {
    if size < 2 {
        return Err(MeshError::HeightmapTooSmall(size));
    }
    if sampled_span(size, lod_step(lod)) < 2 {
        return Err(MeshError::LodTooCoarse { lod, size });
    }
    Ok(())
}

/// Triangulate a heightmap into mesh buffers.
///
/// Grid positions `x, z` are walked with the LOD stride; only the sampled
/// subset becomes vertices, in x-major scan order. Each vertex sits at
/// `(-size/2 + x, height * height_multiplier, -size/2 + z)` with UV
/// `(pos.x / size, pos.z / size)`, centering the mesh on the origin. Every
/// sampled vertex with a right and below neighbour in the *sampled* grid
/// emits the two triangles of that quad; index arithmetic uses the sampled
/// row width, never the raw heightmap width.
///
/// Buffers are sized exactly from the sampled span, so
/// `vertex_count == span * span` and
/// `indices.len() == 6 * (span - 1) * (span - 1)`.
pub fn triangulate(
    heightmap: &Heightmap,
    height_multiplier: f32,
    lod: u32,
) -> Result<MeshBuffers, MeshError> {
    let size = heightmap.size();
    validate(size, lod)?;

    let step = lod_step(lod);
    let span = sampled_span(size, step);
    let row = span as u32;
    let half = size as f32 / 2.0;

    let mut mesh = MeshBuffers::with_capacity(span * span, (span - 1) * (span - 1) * 2);
    let mut index: u32 = 0;
    for xi in 0..span {
        let x = xi * step;
        for zi in 0..span {
            let z = zi * step;
            let px = -half + x as f32;
            let pz = -half + z as f32;
            let py = heightmap.get(x, z) * height_multiplier;
            mesh.push_vertex(
                Vec3::new(px, py, pz),
                Vec2::new(px / size as f32, pz / size as f32),
            );
            if xi < span - 1 && zi < span - 1 {
                mesh.push_triangle(index, index + row + 1, index + row);
                mesh.push_triangle(index, index + 1, index + row + 1);
            }
            index += 1;
        }
    }
    Ok(mesh)
}
