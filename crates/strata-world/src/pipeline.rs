//! Two-stage asynchronous chunk generation pipeline.
//!
//! Stage one generates the heightfield (heights + colour buffer) on a
//! worker thread; stage two triangulates the mesh. Each stage delivers its
//! result through its own [`WorkQueue`], drained once per tick on the main
//! thread. The queues drain independently of each other; within one queue,
//! results dispatch in completion order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use strata_heightfield::{HeightfieldData, HeightfieldError, HeightfieldGenerator, Heightmap};
use strata_mesh::{MeshBuffers, MeshError, triangulate, validate};
use strata_sched::{WorkQueue, WorkerPool};
use tracing::warn;

use crate::chunk::{ChunkHandle, ChunkState};

/// Failure delivered through a result callback instead of a value.
///
/// Invalid parameters never reach here: they are rejected synchronously at
/// the request call. What remains is a worker that panicked mid-task.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Heightfield(#[from] HeightfieldError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// The generation job panicked on its worker thread.
    #[error("generation task panicked")]
    TaskPanicked,
}

/// Result payload of a heightfield request.
pub type HeightfieldResult = Result<HeightfieldData, PipelineError>;

/// Result payload of a mesh request.
pub type MeshResult = Result<MeshBuffers, PipelineError>;

/// Per-tick drain counts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DrainStats {
    /// Heightfield results dispatched this drain.
    pub heightfields: usize,
    /// Mesh results dispatched this drain.
    pub meshes: usize,
}

/// Generation parameters for one chunk.
#[derive(Clone, Copy, Debug)]
pub struct ChunkRequest {
    /// Heightmap edge length (also the chunk's world size).
    pub size: u32,
    /// Noise scale handed to the heightfield generator.
    pub noise_scale: f32,
    /// Vertical scale applied during triangulation.
    pub height_multiplier: f32,
    /// Mesh simplification level.
    pub lod: u32,
}

struct PipelineInner {
    pool: WorkerPool,
    heightfields: WorkQueue<HeightfieldResult>,
    meshes: WorkQueue<MeshResult>,
    generator: HeightfieldGenerator,
}

/// Handle to the shared generation machinery: the worker pool, the two
/// result queues, and the heightfield generator.
///
/// Cloning is cheap and every clone addresses the same pool and queues.
/// Grids and quadtrees receive their pipeline by injection at construction
/// rather than through any global.
#[derive(Clone)]
pub struct GenerationPipeline {
    inner: Arc<PipelineInner>,
}

impl GenerationPipeline {
    /// Create a pipeline with a seeded generator and `worker_threads`
    /// background workers (0 derives a count from the CPUs).
    pub fn new(seed: u32, worker_threads: usize) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                pool: WorkerPool::new(worker_threads),
                heightfields: WorkQueue::new(),
                meshes: WorkQueue::new(),
                generator: HeightfieldGenerator::new(seed),
            }),
        }
    }

    /// Dispatch heightfield generation to a worker.
    ///
    /// Parameter validation happens here, synchronously; the callback only
    /// ever sees a successful payload or a worker failure.
    pub fn request_heightfield<F>(
        &self,
        size: u32,
        scale: f32,
        on_complete: F,
    ) -> Result<(), HeightfieldError>
    where
        F: FnOnce(HeightfieldResult) + Send + 'static,
    {
        if size == 0 {
            return Err(HeightfieldError::InvalidSize(size));
        }
        let inner = Arc::clone(&self.inner);
        self.inner.pool.execute(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                inner.generator.generate_with_colour(size, scale)
            }));
            let result = match outcome {
                Ok(generated) => generated.map_err(PipelineError::from),
                Err(_) => Err(PipelineError::TaskPanicked),
            };
            inner.heightfields.enqueue(result, on_complete);
        });
        Ok(())
    }

    /// Dispatch mesh triangulation to a worker.
    ///
    /// Takes the heightmap by value: the pipeline owns it exclusively until
    /// it is handed to the triangulator. Validation is synchronous.
    pub fn request_mesh<F>(
        &self,
        heightmap: Heightmap,
        height_multiplier: f32,
        lod: u32,
        on_complete: F,
    ) -> Result<(), MeshError>
    where
        F: FnOnce(MeshResult) + Send + 'static,
    {
        validate(heightmap.size(), lod)?;
        let inner = Arc::clone(&self.inner);
        self.inner.pool.execute(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                triangulate(&heightmap, height_multiplier, lod)
            }));
            let result = match outcome {
                Ok(mesh) => mesh.map_err(PipelineError::from),
                Err(_) => Err(PipelineError::TaskPanicked),
            };
            inner.meshes.enqueue(result, on_complete);
        });
        Ok(())
    }

    /// Run the full two-stage pipeline for one chunk.
    ///
    /// The heightfield callback (main thread) applies the colour buffer and
    /// immediately dispatches the mesh stage at the chunk's LOD; the mesh
    /// callback assigns the finished buffers. Failures at either stage mark
    /// the chunk `Failed` instead of being dropped.
    pub fn request_chunk(&self, chunk: &ChunkHandle, request: ChunkRequest) {
        let ChunkRequest {
            size,
            noise_scale,
            height_multiplier,
            lod,
        } = request;

        chunk
            .lock()
            .expect("chunk lock poisoned")
            .set_state(ChunkState::HeightfieldRequested);

        let pipeline = self.clone();
        let handle = Arc::clone(chunk);
        let dispatched = self.request_heightfield(size, noise_scale, move |result| {
            let data = match result {
                Ok(data) => data,
                Err(err) => {
                    warn!(?err, "heightfield generation failed");
                    handle.lock().expect("chunk lock poisoned").mark_failed();
                    return;
                }
            };

            {
                let mut chunk = handle.lock().expect("chunk lock poisoned");
                chunk.apply_colour(data.colour);
                chunk.set_state(ChunkState::MeshRequested);
            }

            let mesh_handle = Arc::clone(&handle);
            let dispatched =
                pipeline.request_mesh(data.heightmap, height_multiplier, lod, move |result| {
                    let mut chunk = mesh_handle.lock().expect("chunk lock poisoned");
                    match result {
                        Ok(mesh) => chunk.apply_mesh(mesh),
                        Err(err) => {
                            warn!(?err, "mesh generation failed");
                            chunk.mark_failed();
                        }
                    }
                });
            if let Err(err) = dispatched {
                warn!(?err, "mesh request rejected");
                handle.lock().expect("chunk lock poisoned").mark_failed();
            }
        });
        if let Err(err) = dispatched {
            warn!(?err, "heightfield request rejected");
            chunk.lock().expect("chunk lock poisoned").mark_failed();
        }
    }

    /// Drain both result queues, invoking completion callbacks on the
    /// calling thread. Call once per tick from the main update context.
    pub fn drain(&self) -> DrainStats {
        DrainStats {
            heightfields: self.inner.heightfields.drain_and_dispatch(),
            meshes: self.inner.meshes.drain_and_dispatch(),
        }
    }

    /// Outstanding work: worker jobs in flight plus undrained results.
    pub fn in_flight(&self) -> usize {
        self.inner.pool.pending() as usize
            + self.inner.heightfields.len()
            + self.inner.meshes.len()
    }

    /// True when no work is queued, executing, or awaiting drain.
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    /// Number of background worker threads.
    pub fn worker_threads(&self) -> usize {
        self.inner.pool.threads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, ChunkKey};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn drain_until_idle(pipeline: &GenerationPipeline, deadline: Duration) {
        let end = Instant::now() + deadline;
        while !pipeline.is_idle() && Instant::now() < end {
            pipeline.drain();
            std::thread::sleep(Duration::from_millis(2));
        }
        pipeline.drain();
    }

    #[test]
    fn test_zero_size_heightfield_rejected_synchronously() {
        let pipeline = GenerationPipeline::new(0, 1);
        let result = pipeline.request_heightfield(0, 0.3, |_| {});
        assert_eq!(result, Err(HeightfieldError::InvalidSize(0)));
        assert!(pipeline.is_idle(), "rejected request must not dispatch work");
    }

    #[test]
    fn test_degenerate_mesh_request_rejected_synchronously() {
        let pipeline = GenerationPipeline::new(0, 1);
        let tiny = HeightfieldGenerator::new(0).generate(1, 0.3).unwrap();
        let result = pipeline.request_mesh(tiny, 10.0, 0, |_| {});
        assert_eq!(result, Err(MeshError::HeightmapTooSmall(1)));

        let small = HeightfieldGenerator::new(0).generate(4, 0.3).unwrap();
        let result = pipeline.request_mesh(small, 10.0, 4, |_| {});
        assert_eq!(result, Err(MeshError::LodTooCoarse { lod: 4, size: 4 }));
        assert!(pipeline.is_idle());
    }

    #[test]
    fn test_heightfield_result_arrives_via_drain() {
        let pipeline = GenerationPipeline::new(7, 2);
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        pipeline
            .request_heightfield(16, 0.3, move |result| {
                *sink.lock().unwrap() = Some(result.map(|d| d.heightmap.size()));
            })
            .unwrap();

        drain_until_idle(&pipeline, Duration::from_secs(20));
        assert!(matches!(*received.lock().unwrap(), Some(Ok(16))));
    }

    #[test]
    fn test_two_stage_chunk_generation_reaches_mesh_ready() {
        let pipeline = GenerationPipeline::new(42, 2);
        let chunk: ChunkHandle = Arc::new(Mutex::new(Chunk::new(ChunkKey::new(0, 0), 16, 0)));
        pipeline.request_chunk(
            &chunk,
            ChunkRequest {
                size: 16,
                noise_scale: 0.3,
                height_multiplier: 10.0,
                lod: 0,
            },
        );

        drain_until_idle(&pipeline, Duration::from_secs(20));

        let chunk = chunk.lock().unwrap();
        assert_eq!(chunk.state(), ChunkState::MeshReady);
        let colour = chunk.colour().expect("colour applied at heightfield stage");
        assert_eq!(colour.size(), 16);
        let mesh = chunk.mesh().expect("mesh assigned at mesh stage");
        assert_eq!(mesh.vertex_count(), 256);
        assert_eq!(mesh.indices.len(), 1350);
    }

    #[test]
    fn test_chunk_request_with_bad_mesh_parameters_marks_failed() {
        // Heightfield succeeds, but LOD 8 on a 16-cell chunk leaves a
        // single sampled vertex per row; the mesh stage is rejected at
        // dispatch and the chunk surfaces it as Failed.
        let pipeline = GenerationPipeline::new(0, 2);
        let chunk: ChunkHandle = Arc::new(Mutex::new(Chunk::new(ChunkKey::new(0, 0), 16, 8)));
        pipeline.request_chunk(
            &chunk,
            ChunkRequest {
                size: 16,
                noise_scale: 0.3,
                height_multiplier: 10.0,
                lod: 8,
            },
        );

        drain_until_idle(&pipeline, Duration::from_secs(20));
        assert_eq!(chunk.lock().unwrap().state(), ChunkState::Failed);
    }

    #[test]
    fn test_queues_drain_independently() {
        // A mesh request completes without anything queued on the
        // heightfield side, and vice versa.
        let pipeline = GenerationPipeline::new(3, 2);
        let map = HeightfieldGenerator::new(3).generate(8, 0.3).unwrap();
        let done = Arc::new(Mutex::new(false));
        let sink = Arc::clone(&done);
        pipeline
            .request_mesh(map, 5.0, 0, move |result| {
                assert!(result.is_ok());
                *sink.lock().unwrap() = true;
            })
            .unwrap();

        drain_until_idle(&pipeline, Duration::from_secs(20));
        assert!(*done.lock().unwrap());
    }

    #[test]
    fn test_clones_share_queues_and_pool() {
        let pipeline = GenerationPipeline::new(0, 1);
        let clone = pipeline.clone();
        let done = Arc::new(Mutex::new(false));
        let sink = Arc::clone(&done);
        clone
            .request_heightfield(8, 0.3, move |result| {
                assert!(result.is_ok());
                *sink.lock().unwrap() = true;
            })
            .unwrap();

        // Draining through the original handle dispatches the clone's work.
        drain_until_idle(&pipeline, Duration::from_secs(20));
        assert!(*done.lock().unwrap());
    }
}
