//! Worker thread pool
//!
//! Fixed set of named threads fed by a bounded `crossbeam` channel.
//!
//! ## Backpressure
//! `execute` blocks once `queue_capacity` jobs are waiting, which stalls the
//! accept loop instead of letting the queue grow without bound. Pending
//! connections then wait in the kernel's listen backlog.
//!
//! ## Failure isolation
//! A job that panics is caught and logged; its worker thread keeps serving.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::Dispatch;

use crate::error::{Result, VaultError};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bounded pool of worker threads
pub struct WorkerPool {
    /// Submission side of the job queue (taken on drop to stop workers)
    sender: Option<Sender<Job>>,

    /// Worker thread handles, joined on drop
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers logging through the current default dispatcher
    pub fn new(size: usize, queue_capacity: usize) -> Result<Self> {
        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        Self::with_dispatch(size, queue_capacity, dispatch)
    }

    /// Spawn `size` workers that log through `dispatch`
    pub fn with_dispatch(size: usize, queue_capacity: usize, dispatch: Dispatch) -> Result<Self> {
        if size == 0 || queue_capacity == 0 {
            return Err(VaultError::Config(
                "worker pool needs at least one thread and one queue slot".to_string(),
            ));
        }

        let (sender, receiver) = channel::bounded::<Job>(queue_capacity);
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let receiver = receiver.clone();
            let dispatch = dispatch.clone();
            let handle = thread::Builder::new()
                .name(format!("filevault-worker-{}", id))
                .spawn(move || {
                    tracing::dispatcher::with_default(&dispatch, || worker_loop(id, receiver))
                })?;
            workers.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queue a job, blocking while the queue is full
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| VaultError::Network("worker pool is shut down".to_string()))?;

        sender
            .send(Box::new(job))
            .map_err(|_| VaultError::Network("all pool workers have exited".to_string()))
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Jobs waiting for a free worker
    pub fn queued(&self) -> usize {
        self.sender.as_ref().map(|s| s.len()).unwrap_or(0)
    }
}

impl Drop for WorkerPool {
    /// Close the queue, let workers drain it, then join them
    fn drop(&mut self) {
        drop(self.sender.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Worker thread terminated abnormally");
            }
        }
    }
}

fn worker_loop(id: usize, receiver: Receiver<Job>) {
    tracing::trace!("Worker {} started", id);

    for job in receiver.iter() {
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(job)) {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Worker {} recovered from panic: {}", id, reason);
        }
    }

    tracing::trace!("Worker {} stopped", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_runs_every_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(4, 2).unwrap();
            assert_eq!(pool.size(), 4);
            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
            // drop joins after the queue drains
        }
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_panic_does_not_kill_worker() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(1, 4).unwrap();
            pool.execute(|| panic!("boom")).unwrap();
            for _ in 0..3 {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_rejects_empty_pool() {
        assert!(WorkerPool::new(0, 1).is_err());
        assert!(WorkerPool::new(1, 0).is_err());
    }
}
