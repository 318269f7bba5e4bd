//! Chunk identity, state, and per-chunk data.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use strata_heightfield::ColourBuffer;
use strata_math::Aabb;
use strata_mesh::MeshBuffers;

/// Shared handle to a chunk.
///
/// Generation callbacks hold a clone while their results are in flight;
/// all mutation happens on the main thread inside drain callbacks, so the
/// lock is effectively uncontended.
pub type ChunkHandle = Arc<Mutex<Chunk>>;

/// Integer grid coordinate identifying a chunk's position.
///
/// World position is `key * chunk_size` per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The key whose chunk contains `position`, by per-axis rounding.
    pub fn containing(position: Vec3, chunk_size: u32) -> Self {
        let cs = chunk_size as f32;
        Self {
            x: (position.x / cs).round() as i32,
            z: (position.z / cs).round() as i32,
        }
    }

    /// World-space position of the chunk this key names.
    pub fn world_position(&self, chunk_size: u32) -> Vec3 {
        let cs = chunk_size as f32;
        Vec3::new(self.x as f32 * cs, 0.0, self.z as f32 * cs)
    }
}

/// Lifecycle of a chunk moving through the two-stage generation pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Chunk object exists; nothing dispatched yet.
    Created,
    /// Heightfield job handed to a worker.
    HeightfieldRequested,
    /// Heightfield drained on the main thread; colour buffer applied.
    HeightfieldReady,
    /// Mesh job handed to a worker.
    MeshRequested,
    /// Mesh drained and assigned. Terminal.
    MeshReady,
    /// A stage failed; the error was surfaced through the result callback.
    Failed,
}

/// One square terrain tile: bounds, LOD, visibility, and (once generated)
/// its colour buffer and mesh buffers.
#[derive(Debug)]
pub struct Chunk {
    key: ChunkKey,
    position: Vec3,
    bounds: Aabb,
    lod: u32,
    state: ChunkState,
    colour: Option<ColourBuffer>,
    mesh: Option<MeshBuffers>,
    visible: bool,
    pub(crate) last_visible_tick: u64,
}

impl Chunk {
    /// Create a chunk on the uniform grid at `key`.
    pub fn new(key: ChunkKey, chunk_size: u32, lod: u32) -> Self {
        Self::at(key, key.world_position(chunk_size), chunk_size, lod)
    }

    /// Create a chunk centred at an arbitrary world position (quadtree
    /// nodes sit off the uniform grid).
    pub fn from_centre(centre: Vec3, chunk_size: u32, lod: u32) -> Self {
        Self::at(ChunkKey::containing(centre, chunk_size), centre, chunk_size, lod)
    }

    fn at(key: ChunkKey, position: Vec3, chunk_size: u32, lod: u32) -> Self {
        let half = chunk_size as f32 / 2.0;
        Self {
            key,
            position,
            // A 1-unit-tall slab around the chunk plane.
            bounds: Aabb::new(position, Vec3::new(half, 0.5, half)),
            lod,
            state: ChunkState::Created,
            colour: None,
            mesh: None,
            visible: false,
            last_visible_tick: 0,
        }
    }

    pub fn key(&self) -> ChunkKey {
        self.key
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn lod(&self) -> u32 {
        self.lod
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Colour buffer, present from `HeightfieldReady` onward.
    pub fn colour(&self) -> Option<&ColourBuffer> {
        self.colour.as_ref()
    }

    /// Mesh buffers, present once the chunk reaches `MeshReady`.
    pub fn mesh(&self) -> Option<&MeshBuffers> {
        self.mesh.as_ref()
    }

    /// Release the mesh buffers, e.g. when the chunk is evicted.
    pub fn take_mesh(&mut self) -> Option<MeshBuffers> {
        self.mesh.take()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Distance test against the live viewer: visible when the squared
    /// distance from the bounding box to the viewer is within the squared
    /// render distance. Updates and returns the visibility flag.
    pub fn update_visibility(&mut self, viewer: Vec3, render_distance: f32) -> bool {
        self.visible = self.bounds.sq_distance(viewer) <= render_distance * render_distance;
        self.visible
    }

    pub(crate) fn set_state(&mut self, state: ChunkState) {
        self.state = state;
    }

    pub(crate) fn apply_colour(&mut self, colour: ColourBuffer) {
        self.colour = Some(colour);
        self.state = ChunkState::HeightfieldReady;
    }

    pub(crate) fn apply_mesh(&mut self, mesh: MeshBuffers) {
        self.mesh = Some(mesh);
        self.state = ChunkState::MeshReady;
    }

    pub(crate) fn mark_failed(&mut self) {
        self.state = ChunkState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_world_position() {
        assert_eq!(
            ChunkKey::new(2, -3).world_position(16),
            Vec3::new(32.0, 0.0, -48.0)
        );
    }

    #[test]
    fn test_key_containing_rounds_per_axis() {
        assert_eq!(
            ChunkKey::containing(Vec3::new(7.0, 0.0, 9.0), 16),
            ChunkKey::new(0, 1)
        );
        assert_eq!(
            ChunkKey::containing(Vec3::new(-25.0, 0.0, 0.0), 16),
            ChunkKey::new(-2, 0)
        );
    }

    #[test]
    fn test_new_chunk_bounds_cover_tile() {
        let chunk = Chunk::new(ChunkKey::new(1, 1), 16, 0);
        assert_eq!(chunk.position(), Vec3::new(16.0, 0.0, 16.0));
        assert!(chunk.bounds().contains_point(Vec3::new(8.0, 0.0, 8.0)));
        assert!(chunk.bounds().contains_point(Vec3::new(24.0, 0.0, 24.0)));
        assert!(!chunk.bounds().contains_point(Vec3::new(25.0, 0.0, 16.0)));
    }

    #[test]
    fn test_visibility_squared_distance_test() {
        let mut chunk = Chunk::new(ChunkKey::new(1, 1), 16, 0);
        // Closest point of the (16,0,16) tile to the origin is (8,0,8).
        assert!(chunk.update_visibility(Vec3::ZERO, 32.0));
        assert!(chunk.is_visible());
        assert!(!chunk.update_visibility(Vec3::new(-300.0, 0.0, 0.0), 32.0));
        assert!(!chunk.is_visible());
    }

    #[test]
    fn test_fresh_chunk_has_no_data() {
        let chunk = Chunk::new(ChunkKey::new(0, 0), 16, 2);
        assert_eq!(chunk.state(), ChunkState::Created);
        assert!(chunk.colour().is_none());
        assert!(chunk.mesh().is_none());
        assert_eq!(chunk.lod(), 2);
    }
}
