//! Thread-safe FIFO of results paired with completion callbacks.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;

use tracing::warn;

struct Pending<T> {
    result: T,
    on_complete: Box<dyn FnOnce(T) + Send>,
}

/// A producer/consumer queue pairing each computed result with the callback
/// that consumes it.
///
/// Any number of worker threads may [`enqueue`](Self::enqueue); exactly one
/// consumer context calls [`drain_and_dispatch`](Self::drain_and_dispatch)
/// once per tick. The internal lock is held only while items are pushed or
/// claimed, never across a callback, so callbacks are free to enqueue
/// further work on this or any other queue.
pub struct WorkQueue<T> {
    pending: Mutex<VecDeque<Pending<T>>>,
}

impl<T> WorkQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a finished result together with its completion callback.
    ///
    /// Callable from any thread; concurrent enqueues serialize on the
    /// queue lock and preserve arrival order.
    pub fn enqueue<F>(&self, result: T, on_complete: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        let mut pending = self.pending.lock().expect("work queue lock poisoned");
        pending.push_back(Pending {
            result,
            on_complete: Box::new(on_complete),
        });
    }

    /// Number of queued items awaiting dispatch.
    pub fn len(&self) -> usize {
        self.pending.lock().expect("work queue lock poisoned").len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claim everything currently queued and invoke each callback in
    /// enqueue order. Returns the number of callbacks invoked.
    ///
    /// Must be called from the single designated consumer context. A
    /// panicking callback is caught and logged; the remaining items still
    /// dispatch and the queue stays usable.
    pub fn drain_and_dispatch(&self) -> usize {
        let claimed = {
            let mut pending = self.pending.lock().expect("work queue lock poisoned");
            std::mem::take(&mut *pending)
        };
        let count = claimed.len();
        for item in claimed {
            let Pending {
                result,
                on_complete,
            } = item;
            if catch_unwind(AssertUnwindSafe(move || on_complete(result))).is_err() {
                warn!("work queue callback panicked; continuing with remaining items");
            }
        }
        count
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_invokes_callback_with_result() {
        let queue = WorkQueue::new();
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        queue.enqueue(41_u32, move |v| {
            *sink.lock().unwrap() = Some(v + 1);
        });

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_and_dispatch(), 1);
        assert_eq!(*received.lock().unwrap(), Some(42));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_order_within_queue() {
        let queue = WorkQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..16_u32 {
            let sink = Arc::clone(&order);
            queue.enqueue(i, move |v| sink.lock().unwrap().push(v));
        }
        queue.drain_and_dispatch();
        assert_eq!(*order.lock().unwrap(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_thousand_concurrent_producers_dispatch_exactly_once() {
        let queue = Arc::new(WorkQueue::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(vec![false; 1000]));

        let producers: Vec<_> = (0..10)
            .map(|t| {
                let queue = Arc::clone(&queue);
                let calls = Arc::clone(&calls);
                let seen = Arc::clone(&seen);
                std::thread::spawn(move || {
                    for i in 0..100_usize {
                        let id = t * 100 + i;
                        let calls = Arc::clone(&calls);
                        let seen = Arc::clone(&seen);
                        queue.enqueue(id, move |id| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            let mut seen = seen.lock().unwrap();
                            assert!(!seen[id], "entry {id} dispatched twice");
                            seen[id] = true;
                        });
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }

        assert_eq!(queue.len(), 1000);
        assert_eq!(queue.drain_and_dispatch(), 1000);
        assert_eq!(calls.load(Ordering::SeqCst), 1000);
        assert!(seen.lock().unwrap().iter().all(|&s| s), "lost entries");
        assert_eq!(queue.drain_and_dispatch(), 0);
    }

    #[test]
    fn test_panicking_callback_does_not_corrupt_queue() {
        let queue = WorkQueue::new();
        let survivors = Arc::new(AtomicUsize::new(0));

        let sink = Arc::clone(&survivors);
        queue.enqueue(1_u32, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        queue.enqueue(2, |_| panic!("boom"));
        let sink = Arc::clone(&survivors);
        queue.enqueue(3, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(queue.drain_and_dispatch(), 3);
        assert_eq!(survivors.load(Ordering::SeqCst), 2);

        // Queue still works after the panic.
        let sink = Arc::clone(&survivors);
        queue.enqueue(4, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(queue.drain_and_dispatch(), 1);
        assert_eq!(survivors.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_callback_may_enqueue_without_deadlock() {
        let queue = Arc::new(WorkQueue::new());
        let chained = Arc::new(AtomicUsize::new(0));

        let q2 = Arc::clone(&queue);
        let sink = Arc::clone(&chained);
        queue.enqueue(0_u32, move |_| {
            q2.enqueue(1, move |_| {
                sink.fetch_add(1, Ordering::SeqCst);
            });
        });

        // First drain runs the outer callback, which enqueues the inner one.
        assert_eq!(queue.drain_and_dispatch(), 1);
        assert_eq!(chained.load(Ordering::SeqCst), 0);
        // Second drain picks it up.
        assert_eq!(queue.drain_and_dispatch(), 1);
        assert_eq!(chained.load(Ordering::SeqCst), 1);
    }
}
