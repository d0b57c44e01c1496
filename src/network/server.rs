//! TCP Server
//!
//! Accepts connections and dispatches them according to the configured
//! [`Mode`].

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::Dispatch;

use super::connection::{Connection, ConnectionOptions};
use super::listener::bind_listener;
use super::pool::WorkerPool;
use super::process::{worker_index, ProcessPool};
use crate::config::{Config, Mode};
use crate::engine::Engine;
use crate::error::Result;

/// Pause after a failed `accept` so descriptor exhaustion doesn't spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// TCP server for FileVault
pub struct Server {
    config: Config,
    engine: Arc<Engine>,

    /// Log sink installed on the accept loop and every worker thread
    dispatch: Dispatch,

    /// Set once shutdown is requested
    shutdown: Arc<AtomicBool>,

    /// Address of the bound listener, used to wake a blocked `accept`
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Server {
    /// Create a new server with the given config and engine
    ///
    /// Logging goes to whatever dispatcher is the default right now;
    /// use [`with_dispatch`](Self::with_dispatch) to pick another sink.
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            dispatch: tracing::dispatcher::get_default(|d| d.clone()),
            shutdown: Arc::new(AtomicBool::new(false)),
            local_addr: Mutex::new(None),
        }
    }

    /// Route this server's logs to `dispatch`
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Get the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Address of the bound listener, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Start the server (blocking)
    ///
    /// In process mode the calling process becomes the pool supervisor,
    /// unless it is itself a pool worker, in which case it serves
    /// connections on its own reuse-port listener.
    pub fn run(&self) -> Result<()> {
        self.config.validate()?;

        tracing::dispatcher::with_default(&self.dispatch, || {
            if let Some(index) = worker_index() {
                return self.run_process_worker(index);
            }

            match self.config.mode {
                Mode::Single | Mode::Thread => {
                    let listener = self.bind()?;
                    self.serve(listener)
                }
                Mode::Process => self.run_process_pool(),
            }
        })
    }

    /// Bind the configured address
    ///
    /// Failure here is fatal for the whole service.
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr()?;
        let listener = bind_listener(addr, false, self.config.backlog)?;
        self.record_addr(&listener)?;
        Ok(listener)
    }

    /// Serve connections from `listener` until shutdown
    ///
    /// Process mode falls back to the single-threaded loop here, which is
    /// what each pool worker runs.
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        tracing::dispatcher::with_default(&self.dispatch, || match self.config.mode {
            Mode::Single | Mode::Process => self.serve_single(listener),
            Mode::Thread => self.serve_pooled(listener),
        })
    }

    /// Signal the server to shutdown gracefully
    ///
    /// The accept loop exits after its current connection; in thread mode
    /// queued connections are still served before `serve` returns. A
    /// process-pool supervisor kills its workers instead.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);

        if let Some(mut addr) = self.local_addr() {
            if addr.ip().is_unspecified() {
                let loopback: std::net::IpAddr = match addr {
                    SocketAddr::V4(_) => std::net::Ipv4Addr::LOCALHOST.into(),
                    SocketAddr::V6(_) => std::net::Ipv6Addr::LOCALHOST.into(),
                };
                addr.set_ip(loopback);
            }
            // wake the blocking accept so it sees the flag
            let _ = TcpStream::connect_timeout(&addr, Duration::from_secs(1));
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Policies
    // =========================================================================

    fn serve_single(&self, listener: TcpListener) -> Result<()> {
        tracing::info!("Single-threaded server listening on {}", self.describe(&listener));
        let options = ConnectionOptions::from(&self.config);

        self.accept_loop(&listener, |stream| {
            Connection::serve(stream, Arc::clone(&self.engine), &options);
            Ok(())
        })
    }

    fn serve_pooled(&self, listener: TcpListener) -> Result<()> {
        let workers = self.config.workers;
        let capacity = self.config.queue_capacity();
        let pool = WorkerPool::with_dispatch(workers, capacity, self.dispatch.clone())?;

        tracing::info!(
            "Thread-pool server listening on {} with {} workers (queue {})",
            self.describe(&listener),
            workers,
            capacity
        );
        let options = ConnectionOptions::from(&self.config);

        self.accept_loop(&listener, |stream| {
            let engine = Arc::clone(&self.engine);
            pool.execute(move || Connection::serve(stream, engine, &options))
        })
    }

    fn run_process_pool(&self) -> Result<()> {
        tracing::info!(
            "Starting process-pool server on {} with {} workers",
            self.config.listen_addr(),
            self.config.workers
        );
        ProcessPool::from_current_exe(self.config.workers)?.run_until(&self.shutdown)
    }

    fn run_process_worker(&self, index: usize) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = bind_listener(addr, true, self.config.backlog)?;
        self.record_addr(&listener)?;

        tracing::info!("[PID {}] Worker {} ready", std::process::id(), index);
        self.serve_single(listener)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Accept until shutdown, handing each stream to `dispatch`
    ///
    /// Accept errors are logged and skipped; only a failing `dispatch`
    /// ends the loop with an error.
    fn accept_loop<F>(&self, listener: &TcpListener, mut dispatch: F) -> Result<()>
    where
        F: FnMut(TcpStream) -> Result<()>,
    {
        while !self.is_shutdown() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if self.is_shutdown() {
                        break;
                    }
                    tracing::debug!("Accepted connection from {}", peer);
                    dispatch(stream)?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Error accepting connection: {}", e);
                    std::thread::sleep(ACCEPT_BACKOFF);
                }
            }
        }

        tracing::info!("Server stopped accepting connections");
        Ok(())
    }

    fn record_addr(&self, listener: &TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        *self.local_addr.lock() = Some(addr);
        Ok(())
    }

    fn describe(&self, listener: &TcpListener) -> String {
        listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.config.listen_addr())
    }
}
