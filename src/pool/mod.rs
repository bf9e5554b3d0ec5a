//! Worker pool
//!
//! A fixed-size set of OS threads pulling boxed jobs from a shared queue.
//! The orchestrator only needs two operations from it: `submit` to enqueue a
//! contraction task and `wait_idle` as the round barrier (queue empty AND no
//! job mid-execution). Each pool is an owned value — nothing process-global —
//! so independent contractions can run side by side.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    active: usize,
    stop: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    work_available: Condvar,
    idle: Condvar,
}

/// Fixed-size worker pool with an idle barrier.
#[derive(Debug)]
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::default()),
            work_available: Condvar::new(),
            idle: Condvar::new(),
        });
        let workers = (0..workers.max(1))
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(&shared))
            })
            .collect();
        Self { shared, workers }
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a job. Returns `false` once shutdown has begun.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> bool {
        let mut queue = self.shared.queue.lock();
        if queue.stop {
            return false;
        }
        queue.jobs.push_back(Box::new(job));
        self.shared.work_available.notify_one();
        true
    }

    /// Block until the queue is empty and no submitted job is executing.
    pub fn wait_idle(&self) {
        let mut queue = self.shared.queue.lock();
        while !(queue.jobs.is_empty() && queue.active == 0) {
            self.shared.idle.wait(&mut queue);
        }
    }
}

impl Drop for WorkerPool {
    /// Graceful shutdown: queued and in-flight jobs finish before the
    /// threads are joined.
    fn drop(&mut self) {
        {
            let mut queue = self.shared.queue.lock();
            queue.stop = true;
        }
        self.shared.work_available.notify_all();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.lock();
        f.debug_struct("Shared")
            .field("queued", &queue.jobs.len())
            .field("active", &queue.active)
            .field("stop", &queue.stop)
            .finish()
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(job) = queue.jobs.pop_front() {
                    queue.active += 1;
                    break job;
                }
                if queue.stop {
                    return;
                }
                shared.work_available.wait(&mut queue);
            }
        };
        job();
        let mut queue = shared.queue.lock();
        queue.active -= 1;
        if queue.jobs.is_empty() && queue.active == 0 {
            shared.idle.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_wait_idle_sees_all_jobs_finish() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            assert!(pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_wait_idle_on_fresh_pool_returns_immediately() {
        let pool = WorkerPool::new(2);
        pool.wait_idle();
    }

    #[test]
    fn test_single_worker_pool() {
        let pool = WorkerPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_zero_requested_workers_still_runs() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.workers(), 1);
    }

    #[test]
    fn test_drop_drains_queued_work() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(2);
            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }
}
