//! Control listener: the TCP socket for the local monitoring channel.
//!
//! The daemon exposes an auxiliary text interface for inspection and
//! reconfiguration. This module only builds the listening socket;
//! accepting and driving connections belongs to the layer above.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};

use mio::event::Source;
use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};
use rustix::net::{self, sockopt, AddressFamily, SocketAddrAny, SocketType};

use super::fd::{set_cloexec, set_nonblocking};
use super::{Endpoint, SetupError};
use crate::trace::debug;

/// Listen backlog for the control channel. A low-volume local
/// interface, not internet-facing traffic; two pending connections
/// is sufficient.
const CONTROL_BACKLOG: i32 = 2;

/// The non-blocking TCP listener for the monitoring channel.
#[derive(Debug)]
pub struct ControlListener {
    fd: OwnedFd,
}

impl ControlListener {
    /// Opens the control listener on the given port.
    ///
    /// With `local_only` set the listener binds to `[::1]` and is
    /// unreachable from off the host; otherwise it binds to the
    /// wildcard address. Either way the descriptor returned is
    /// non-blocking, close-on-exec, and already listening. If any
    /// step fails the descriptor is closed before the error is
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] naming the failing step and carrying
    /// the original OS error.
    pub fn open(port: u16, local_only: bool) -> Result<Self, SetupError> {
        // Same discipline as the protocol socket: `fd` owns the
        // descriptor and every early return closes it.
        let fd = net::socket(AddressFamily::INET6, SocketType::STREAM, None)
            .map_err(|e| SetupError::os("socket", e))?;

        sockopt::set_socket_reuseaddr(&fd, true).map_err(|e| SetupError::os("SO_REUSEADDR", e))?;
        set_nonblocking(&fd).map_err(|e| SetupError::os("O_NONBLOCK", e))?;
        set_cloexec(&fd).map_err(|e| SetupError::os("FD_CLOEXEC", e))?;

        let endpoint = if local_only {
            Endpoint::localhost(port)
        } else {
            Endpoint::any(port)
        };
        net::bind_v6(&fd, &endpoint.as_socket_addr()).map_err(|e| SetupError::os("bind", e))?;
        net::listen(&fd, CONTROL_BACKLOG).map_err(|e| SetupError::os("listen", e))?;

        debug!("control listener on {endpoint}");
        Ok(Self { fd })
    }

    /// Returns the local address this listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be retrieved.
    pub fn local_addr(&self) -> io::Result<Endpoint> {
        match net::getsockname(&self.fd)? {
            SocketAddrAny::V6(v6) => Ok(Endpoint::from(v6)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "control listener has a non-IPv6 local address",
            )),
        }
    }
}

impl AsFd for ControlListener {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for ControlListener {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl Source for ControlListener {
    fn register(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        SourceFd(&self.fd.as_raw_fd()).register(registry, token, interests)
    }

    fn reregister(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        SourceFd(&self.fd.as_raw_fd()).reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        SourceFd(&self.fd.as_raw_fd()).deregister(registry)
    }
}
