//! Adaptive quadtree subdivision around the viewer.
//!
//! Each node covers a square region and owns a generated chunk at its LOD.
//! Inserting the viewer position subdivides nodes whose child centres fall
//! within the node's distance threshold, halving chunk size, LOD, and
//! threshold at each level. Finer chunks therefore appear near the viewer
//! while distant regions keep a single coarse chunk.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use strata_math::Aabb;

use crate::chunk::{Chunk, ChunkHandle};
use crate::pipeline::{ChunkRequest, GenerationPipeline};

/// Generation parameters shared by every node of one tree.
#[derive(Clone, Copy, Debug)]
pub struct QuadtreeSettings {
    /// Noise scale for heightfield generation.
    pub noise_scale: f32,
    /// Vertical scale for triangulation.
    pub height_multiplier: f32,
    /// Nodes at or below this size never subdivide; they bound the
    /// recursion depth at `log2(root_size / min_chunk_size)`.
    pub min_chunk_size: u32,
}

impl Default for QuadtreeSettings {
    fn default() -> Self {
        Self {
            noise_scale: 0.3,
            height_multiplier: 10.0,
            min_chunk_size: 2,
        }
    }
}

/// A leaf of the tree, described for the consuming engine.
pub struct LeafChunk {
    pub centre: Vec3,
    pub chunk_size: u32,
    pub lod: u32,
    pub chunk: ChunkHandle,
}

/// One node of the terrain quadtree.
///
/// Children are exclusively owned; a node with children is "divided" and no
/// longer visible itself: its chunk is superseded by the four finer ones.
pub struct TerrainQuadTree {
    centre: Vec3,
    chunk_size: u32,
    lod: u32,
    distance_threshold: f32,
    bounds: Aabb,
    visible: bool,
    chunk: ChunkHandle,
    children: Option<Box<[TerrainQuadTree; 4]>>,
    settings: QuadtreeSettings,
    pipeline: GenerationPipeline,
}

impl TerrainQuadTree {
    /// Create a node and immediately request its chunk (heightfield, then
    /// mesh at this node's LOD) through the injected pipeline.
    pub fn new(
        centre: Vec3,
        chunk_size: u32,
        lod: u32,
        distance_threshold: f32,
        settings: QuadtreeSettings,
        pipeline: GenerationPipeline,
    ) -> Self {
        let half = chunk_size as f32 / 2.0;
        let mut node_chunk = Chunk::from_centre(centre, chunk_size, lod);
        // A fresh node is its own visible leaf until it subdivides.
        node_chunk.set_visible(true);
        let chunk: ChunkHandle = Arc::new(Mutex::new(node_chunk));
        pipeline.request_chunk(
            &chunk,
            ChunkRequest {
                size: chunk_size,
                noise_scale: settings.noise_scale,
                height_multiplier: settings.height_multiplier,
                lod,
            },
        );
        Self {
            centre,
            chunk_size,
            lod,
            distance_threshold,
            bounds: Aabb::new(centre, Vec3::new(half, 0.5, half)),
            visible: true,
            chunk,
            children: None,
            settings,
            pipeline,
        }
    }

    pub fn centre(&self) -> Vec3 {
        self.centre
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn lod(&self) -> u32 {
        self.lod
    }

    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// This node's chunk handle (generated at its LOD).
    pub fn chunk(&self) -> &ChunkHandle {
        &self.chunk
    }

    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    /// False once the node has subdivided: children supersede its chunk.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn children(&self) -> Option<&[TerrainQuadTree; 4]> {
        self.children.as_deref()
    }

    /// Refine the tree towards the viewer position.
    ///
    /// Stops (keeping this node a leaf with its existing chunk) when the
    /// viewer is outside this node's bounds or the node is already at the
    /// minimum chunk size. Otherwise, if any quadrant centre lies within
    /// the distance threshold, all four children are created eagerly and
    /// the insertion recurses into each of them, re-evaluating the viewer
    /// at the next depth uniformly.
    pub fn insert_point(&mut self, viewer: Vec3) {
        if !self.bounds.contains_point(viewer) || self.chunk_size <= self.settings.min_chunk_size {
            return;
        }

        let offset = (self.chunk_size / 2) as f32;
        let child_centres = [
            Vec3::new(self.centre.x - offset, 0.0, self.centre.z - offset),
            Vec3::new(self.centre.x + offset, 0.0, self.centre.z - offset),
            Vec3::new(self.centre.x - offset, 0.0, self.centre.z + offset),
            Vec3::new(self.centre.x + offset, 0.0, self.centre.z + offset),
        ];

        if self.children.is_none()
            && child_centres
                .iter()
                .any(|c| viewer.distance(*c) < self.distance_threshold)
        {
            self.subdivide(child_centres);
        }

        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.insert_point(viewer);
            }
        }
    }

    /// Create all four children at half size, half LOD, half threshold,
    /// and hide this node's own chunk.
    fn subdivide(&mut self, child_centres: [Vec3; 4]) {
        let child_size = self.chunk_size / 2;
        let child_lod = self.lod / 2;
        let child_threshold = self.distance_threshold / 2.0;
        let children = child_centres.map(|centre| {
            TerrainQuadTree::new(
                centre,
                child_size,
                child_lod,
                child_threshold,
                self.settings,
                self.pipeline.clone(),
            )
        });
        self.children = Some(Box::new(children));
        self.visible = false;
        self.chunk
            .lock()
            .expect("chunk lock poisoned")
            .set_visible(false);
    }

    /// Collect every leaf, finest-detail chunks near the viewer included.
    pub fn leaves(&self) -> Vec<LeafChunk> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<LeafChunk>) {
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.collect_leaves(out);
                }
            }
            None => out.push(LeafChunk {
                centre: self.centre,
                chunk_size: self.chunk_size,
                lod: self.lod,
                chunk: Arc::clone(&self.chunk),
            }),
        }
    }

    /// Depth of the deepest node, root at 0.
    pub fn depth(&self) -> u32 {
        match &self.children {
            Some(children) => 1 + children.iter().map(TerrainQuadTree::depth).max().unwrap_or(0),
            None => 0,
        }
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flat_map(|c| c.iter())
            .map(TerrainQuadTree::node_count)
            .sum::<usize>()
    }
}
