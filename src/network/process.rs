//! Process pool
//!
//! Pre-forks worker processes by re-executing a program (normally the
//! current binary) with [`WORKER_ENV`] set to the worker index. Each child
//! opens its own SO_REUSEPORT listener and runs the single-threaded accept
//! loop, so the kernel does the load balancing and nothing is shared.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{Result, VaultError};

/// Environment variable marking a process as a pool worker
pub const WORKER_ENV: &str = "FILEVAULT_WORKER";

/// How often the supervisor polls for exited workers and the stop flag
const REAP_INTERVAL: Duration = Duration::from_millis(100);

/// Index of this process within a process pool, if it is a worker
pub fn worker_index() -> Option<usize> {
    std::env::var(WORKER_ENV).ok()?.parse().ok()
}

/// Supervises a fixed set of worker processes
#[derive(Debug, Clone)]
pub struct ProcessPool {
    workers: usize,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessPool {
    /// Pool that launches `program args..` once per worker
    pub fn new(workers: usize, program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            workers,
            program: program.into(),
            args,
        }
    }

    /// Pool that re-executes the running binary with its own arguments
    pub fn from_current_exe(workers: usize) -> Result<Self> {
        let program = std::env::current_exe()?;
        let args = std::env::args_os().skip(1).collect();
        Ok(Self::new(workers, program, args))
    }

    /// Number of worker processes
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start every worker and block until all of them exit
    ///
    /// Fails if any worker could not be started or exited unsuccessfully.
    pub fn run(&self) -> Result<()> {
        self.run_until(&AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but kills the remaining workers once `stop`
    /// is set
    ///
    /// Workers killed this way do not count as failures.
    pub fn run_until(&self, stop: &AtomicBool) -> Result<()> {
        if self.workers == 0 {
            return Err(VaultError::Config("process pool needs at least one worker".to_string()));
        }

        let mut children: Vec<Option<Child>> = self.spawn_all()?.into_iter().map(Some).collect();
        let mut running = children.len();
        let mut failed = 0;

        while running > 0 {
            if stop.load(Ordering::SeqCst) {
                tracing::info!("Stopping {} worker processes", running);
                for (index, slot) in children.iter_mut().enumerate() {
                    if let Some(mut child) = slot.take() {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::debug!("Worker {} (pid {}) killed", index, child.id());
                    }
                }
                break;
            }

            for (index, slot) in children.iter_mut().enumerate() {
                let Some(child) = slot.as_mut() else { continue };
                let pid = child.id();

                match child.try_wait() {
                    Ok(None) => continue,
                    Ok(Some(status)) if status.success() => {
                        tracing::info!("Worker {} (pid {}) exited", index, pid);
                    }
                    Ok(Some(status)) => {
                        tracing::error!("Worker {} (pid {}) failed: {}", index, pid, status);
                        failed += 1;
                    }
                    Err(e) => {
                        tracing::error!("Could not wait for worker {} (pid {}): {}", index, pid, e);
                        let _ = child.kill();
                        failed += 1;
                    }
                }

                *slot = None;
                running -= 1;
            }

            if running > 0 {
                std::thread::sleep(REAP_INTERVAL);
            }
        }

        if failed > 0 {
            return Err(VaultError::Network(format!(
                "{} of {} worker processes failed",
                failed, self.workers
            )));
        }
        Ok(())
    }

    fn spawn_all(&self) -> Result<Vec<Child>> {
        let mut children = Vec::with_capacity(self.workers);

        for index in 0..self.workers {
            let spawned = Command::new(&self.program)
                .args(&self.args)
                .env(WORKER_ENV, index.to_string())
                .spawn();

            match spawned {
                Ok(child) => {
                    tracing::info!("Started worker {} (pid {})", index, child.id());
                    children.push(child);
                }
                Err(e) => {
                    tracing::error!("Failed to start worker {}: {}", index, e);
                    for mut child in children {
                        let _ = child.kill();
                        let _ = child.wait();
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(children)
    }
}
