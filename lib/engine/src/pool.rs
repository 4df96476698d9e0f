//! Bounded worker pool for pair scoring
//!
//! One task per (target key, source key) pair, executed by a small fixed set
//! of worker threads so that simultaneous outbound calls to external
//! collaborators stay bounded no matter how many pairs a request produces.
//! Tasks are pure functions of their inputs plus read-only shared caches, so
//! no ordering between them is required or assumed.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Pool size is capped regardless of pair count
pub const DEFAULT_WORKERS: usize = 8;

/// Request-scoped cancellation flag, cloned into every task
///
/// Cancelling does not interrupt a running task; it makes queued tasks
/// no-ops so a failing request drains quickly instead of producing partial,
/// inconsistent results.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Job>,
    active: usize,
    running: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    work: Condvar,
    done: Condvar,
}

/// Fixed-size worker pool with a FIFO job queue
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                active: 0,
                running: true,
            }),
            work: Condvar::new(),
            done: Condvar::new(),
        });

        let handles = (0..workers)
            .map(|worker_id| {
                let shared = shared.clone();
                thread::Builder::new()
                    .name(format!("score-worker-{}", worker_id))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn scoring worker thread")
            })
            .collect();

        Self { shared, handles }
    }

    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        let mut state = self.shared.state.lock();
        state.queue.push_back(Box::new(job));
        self.shared.work.notify_one();
    }

    /// Block until every submitted job has finished
    pub fn join(&self) {
        let mut state = self.shared.state.lock();
        while !state.queue.is_empty() || state.active > 0 {
            self.shared.done.wait(&mut state);
        }
    }

    pub fn pending_jobs(&self) -> usize {
        self.shared.state.lock().queue.len()
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    state.active += 1;
                    break job;
                }
                if !state.running {
                    return;
                }
                shared.work.wait(&mut state);
            }
        };

        job();

        let mut state = shared.state.lock();
        state.active -= 1;
        if state.queue.is_empty() && state.active == 0 {
            shared.done.notify_all();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.running = false;
        }
        self.shared.work.notify_all();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_all_jobs_run() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.join();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(pool.pending_jobs(), 0);
    }

    #[test]
    fn test_join_with_no_jobs_returns() {
        let pool = WorkerPool::new(2);
        pool.join();
    }

    #[test]
    fn test_pool_size_floor_of_one() {
        let pool = WorkerPool::new(0);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        pool.submit(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        pool.join();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancelled_jobs_become_noops() {
        let pool = WorkerPool::new(2);
        let token = CancelToken::new();
        let counter = Arc::new(AtomicUsize::new(0));

        token.cancel();
        for _ in 0..10 {
            let token = token.clone();
            let counter = counter.clone();
            pool.submit(move || {
                if token.is_cancelled() {
                    return;
                }
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.join();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
