//! Listening socket setup
//!
//! Uses `socket2` so the process pool can enable SO_REUSEPORT before
//! binding. With it, every worker process binds the same address and the
//! kernel spreads incoming connections across them.

use std::net::{SocketAddr, TcpListener};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::Result;

/// Create a blocking TCP listener on `addr`
pub fn bind_listener(addr: SocketAddr, reuse_port: bool, backlog: i32) -> Result<TcpListener> {
    let domain = match addr {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    #[cfg(unix)]
    socket.set_reuse_address(true)?;

    if reuse_port {
        enable_reuse_port(&socket)?;
    }

    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}

#[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
fn enable_reuse_port(socket: &Socket) -> Result<()> {
    socket.set_reuse_port(true)?;
    Ok(())
}

#[cfg(not(all(unix, not(any(target_os = "solaris", target_os = "illumos")))))]
fn enable_reuse_port(_socket: &Socket) -> Result<()> {
    tracing::warn!("SO_REUSEPORT is not supported on this platform");
    Ok(())
}
