//! Background scheduling primitives for terrain generation.
//!
//! [`WorkQueue`] pairs computed results with completion callbacks and hands
//! them from worker threads to a single consumer tick. [`WorkerPool`] runs
//! the jobs that produce those results on a bounded set of long-lived
//! threads, so a burst of generation requests never translates into a burst
//! of OS threads.

mod work_queue;
mod worker_pool;

pub use work_queue::WorkQueue;
pub use worker_pool::WorkerPool;
