//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - One accept loop per listening socket
//! - Each accepted connection goes to exactly one worker
//! - Three interchangeable policies, picked by [`Mode`](crate::config::Mode):
//!   - `single`: handle inline, then accept the next
//!   - `thread`: bounded pool of worker threads behind a bounded queue
//!   - `process`: N worker processes, each with its own SO_REUSEPORT listener
//!
//! The policy only changes throughput and isolation. Every connection sees
//! the same one-shot request/response exchange.

mod connection;
mod listener;
mod pool;
mod process;
mod server;

pub use connection::{Connection, ConnectionOptions};
pub use listener::bind_listener;
pub use pool::WorkerPool;
pub use process::{worker_index, ProcessPool, WORKER_ENV};
pub use server::Server;
