//! Demo passes exercising the streaming grid and the quadtree.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use strata_config::Config;
use strata_world::{
    ChunkGrid, ChunkState, GenerationPipeline, GridSettings, QuadtreeSettings, TerrainQuadTree,
};
use tracing::{debug, info};

fn pipeline_from(config: &Config) -> GenerationPipeline {
    GenerationPipeline::new(config.terrain.seed, config.streaming.worker_threads)
}

/// Drain the pipeline until it settles or the deadline passes.
fn settle(pipeline: &GenerationPipeline, deadline: Duration) {
    let end = Instant::now() + deadline;
    while !pipeline.is_idle() && Instant::now() < end {
        pipeline.drain();
        std::thread::sleep(Duration::from_millis(2));
    }
    pipeline.drain();
}

/// Walk a seeded random viewer across the world for `ticks` update cycles.
pub fn run_endless_walk(config: &Config, ticks: u64) {
    let pipeline = pipeline_from(config);
    let settings = GridSettings {
        chunk_size: config.terrain.chunk_size,
        render_distance: config.streaming.render_distance,
        noise_scale: config.terrain.noise_scale,
        height_multiplier: config.terrain.height_multiplier,
        lod: config.terrain.lod,
        max_resident: match config.streaming.max_resident_chunks {
            0 => None,
            n => Some(n),
        },
    };
    let mut grid = ChunkGrid::new(settings, pipeline.clone());
    grid.set_eviction_hook(Box::new(|key, _chunk| {
        debug!(?key, "released chunk");
    }));

    info!(
        ticks,
        workers = pipeline.worker_threads(),
        "endless walk starting"
    );
    let mut rng = Xoshiro256StarStar::seed_from_u64(config.terrain.seed as u64);
    let step = config.terrain.chunk_size as f32 * 0.5;
    let mut viewer = Vec3::ZERO;
    for tick in 0..ticks {
        viewer.x += rng.gen_range(-step..=step);
        viewer.z += rng.gen_range(-step..=step);
        grid.update(viewer);
        let stats = grid.drain();
        if tick % 10 == 0 {
            info!(
                tick,
                visible = grid.visible_count(),
                resident = grid.chunk_count(),
                heightfields = stats.heightfields,
                meshes = stats.meshes,
                in_flight = pipeline.in_flight(),
                "tick"
            );
        }
    }

    settle(&pipeline, Duration::from_secs(30));
    let ready = grid
        .chunks()
        .filter(|(_, handle)| {
            handle.lock().expect("chunk lock poisoned").state() == ChunkState::MeshReady
        })
        .count();
    info!(
        resident = grid.chunk_count(),
        ready,
        visible = grid.visible_count(),
        "endless walk finished"
    );
}

/// Subdivide a quadtree around a near-origin viewer and report leaf LODs.
pub fn run_quadtree_pass(config: &Config) {
    let pipeline = pipeline_from(config);
    let root_size = config.quadtree.root_chunk_size;
    let settings = QuadtreeSettings {
        noise_scale: config.terrain.noise_scale,
        height_multiplier: config.terrain.height_multiplier,
        min_chunk_size: config.quadtree.min_chunk_size,
    };
    let mut root = TerrainQuadTree::new(
        Vec3::ZERO,
        root_size,
        config.quadtree.root_lod,
        root_size as f32 * config.quadtree.distance_threshold_factor,
        settings,
        pipeline.clone(),
    );

    let viewer = Vec3::new(root_size as f32 * 0.3, 0.0, root_size as f32 * 0.3);
    root.insert_point(viewer);
    settle(&pipeline, Duration::from_secs(30));

    let leaves = root.leaves();
    let mut by_lod: BTreeMap<u32, usize> = BTreeMap::new();
    for leaf in &leaves {
        *by_lod.entry(leaf.lod).or_default() += 1;
    }
    info!(
        nodes = root.node_count(),
        depth = root.depth(),
        leaves = leaves.len(),
        "quadtree subdivided"
    );
    for (lod, count) in by_lod {
        info!(lod, count, "leaf chunks");
    }
}
