//! Bounded pool of long-lived worker threads.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Sender, unbounded};
use tracing::error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of named worker threads fed from a shared channel.
///
/// Jobs are pure computations: they produce plain data and hand it off
/// (typically via a [`WorkQueue`](crate::WorkQueue)), never touching engine
/// resources. Workers survive panicking jobs. Dropping the pool closes the
/// channel; workers finish their current job and exit.
pub struct WorkerPool {
    sender: Sender<Job>,
    pending: Arc<AtomicU64>,
    threads: usize,
}

impl WorkerPool {
    /// Spawn a pool with `threads` workers. A count of 0 derives one from
    /// the CPU count, leaving headroom for the main thread.
    pub fn new(threads: usize) -> Self {
        let threads = if threads == 0 {
            (num_cpus::get().max(2) - 1).max(1)
        } else {
            threads
        };
        let (sender, receiver) = unbounded::<Job>();
        let pending = Arc::new(AtomicU64::new(0));

        for i in 0..threads {
            let receiver = receiver.clone();
            let pending = Arc::clone(&pending);
            std::thread::Builder::new()
                .name(format!("terrain-worker-{i}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!("worker job panicked; worker continues");
                        }
                        pending.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .expect("failed to spawn terrain worker thread");
        }

        Self {
            sender,
            pending,
            threads,
        }
    }

    /// Submit a job for background execution.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending.fetch_add(1, Ordering::Relaxed);
        if self.sender.send(Box::new(job)).is_err() {
            self.pending.fetch_sub(1, Ordering::Relaxed);
            error!("worker pool channel closed; job dropped");
        }
    }

    /// Jobs submitted but not yet finished (queued or executing).
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Number of worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.threads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn wait_until(pool: &WorkerPool, deadline: Duration) {
        let end = Instant::now() + deadline;
        while pool.pending() > 0 && Instant::now() < end {
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_executes_all_jobs() {
        let pool = WorkerPool::new(4);
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..64 {
            let done = Arc::clone(&done);
            pool.execute(move || {
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        wait_until(&pool, Duration::from_secs(10));
        assert_eq!(done.load(Ordering::SeqCst), 64);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_zero_thread_count_derives_from_cpus() {
        let pool = WorkerPool::new(0);
        assert!(pool.threads() >= 1);
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let pool = WorkerPool::new(1);
        pool.execute(|| panic!("job failure"));
        let done = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&done);
        pool.execute(move || {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        wait_until(&pool, Duration::from_secs(10));
        assert_eq!(done.load(Ordering::SeqCst), 1, "worker died after panic");
    }

    #[test]
    fn test_jobs_run_off_the_submitting_thread() {
        let pool = WorkerPool::new(2);
        let submitter = std::thread::current().id();
        let off_thread = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&off_thread);
        pool.execute(move || {
            if std::thread::current().id() != submitter {
                sink.fetch_add(1, Ordering::SeqCst);
            }
        });
        wait_until(&pool, Duration::from_secs(10));
        assert_eq!(off_thread.load(Ordering::SeqCst), 1);
    }
}
