//! Mesh buffer container produced by triangulation.

use glam::{Vec2, Vec3};

/// Plain mesh data ready for upload by the host engine.
///
/// `indices` holds triangles as index triples into `positions`/`uvs`, wound
/// counter-clockwise when viewed from above (+y), so surface normals face
/// upward.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions, centered on the mesh origin.
    pub positions: Vec<Vec3>,
    /// Per-vertex texture coordinates.
    pub uvs: Vec<Vec2>,
    /// Triangle index list, three entries per triangle.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with room for `vertices` vertices and
    /// `triangles` triangles.
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append one vertex.
    pub fn push_vertex(&mut self, position: Vec3, uv: Vec2) {
        self.positions.push(position);
        self.uvs.push(uv);
    }

    /// Append one triangle by vertex indices.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Approximate heap footprint in bytes, for eviction accounting.
    pub fn byte_size(&self) -> usize {
        self.positions.len() * size_of::<Vec3>()
            + self.uvs.len() * size_of::<Vec2>()
            + self.indices.len() * size_of::<u32>()
    }
}
