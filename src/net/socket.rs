//! Protocol socket: the UDP transport for routing exchanges.
//!
//! The socket is IPv6-only and strictly link-local: unicast and
//! multicast hop limits are pinned to 1 and multicast loopback is
//! disabled, so packets never leave the attached link and the daemon
//! never hears its own transmissions. The descriptor is non-blocking
//! and close-on-exec; register it with mio's [`Poll`] and only receive
//! once the event loop reports it readable.
//!
//! [`Poll`]: mio::Poll

use std::io::{self, IoSlice};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::time::Duration;

use mio::event::Source;
use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};
use rustix::event::PollFlags;
use rustix::io::Errno;
use rustix::net::{
    self, sockopt, AddressFamily, RecvFlags, SendAncillaryBuffer, SendFlags, SocketAddrAny,
    SocketType,
};

use super::fd::{set_cloexec, set_nonblocking, wait_ready, Readiness};
use super::{Endpoint, SetupError};
use crate::trace::{debug, trace, warn};

/// IPv6 traffic class for protocol packets: DSCP CS6, the
/// "internetwork control" marking routing protocols conventionally
/// carry. Applied best-effort; the protocol is correct without it.
const TCLASS_INTERNET_CONTROL: u32 = 0xc0;

/// Hop limit for all protocol traffic. The protocol speaks only to
/// directly attached neighbors.
const LINK_LOCAL_HOPS: u8 = 1;

/// Ceiling on the time one send may spend waiting for a full send
/// buffer to drain. The protocol tolerates a lost datagram; it does
/// not tolerate the event loop stalling indefinitely.
const SEND_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// The non-blocking UDP socket carrying routing protocol exchanges.
pub struct ProtocolSocket {
    fd: OwnedFd,
}

impl ProtocolSocket {
    /// Opens the protocol socket bound to `[::]:port`.
    ///
    /// The handle comes back fully configured: IPv6-only, address
    /// reuse enabled, multicast loopback disabled, hop limits pinned
    /// to 1, traffic class marked (best-effort), non-blocking,
    /// close-on-exec, and bound. If any required step fails the
    /// descriptor is closed before the error is reported; a
    /// half-configured handle never escapes.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] naming the failing step and carrying
    /// the original OS error.
    pub fn open(port: u16) -> Result<Self, SetupError> {
        // `fd` owns the descriptor: every early return below closes it.
        // Only the success path moves it into the handle.
        let fd = net::socket(AddressFamily::INET6, SocketType::DGRAM, None)
            .map_err(|e| SetupError::os("socket", e))?;

        sockopt::set_ipv6_v6only(&fd, true).map_err(|e| SetupError::os("IPV6_V6ONLY", e))?;
        sockopt::set_socket_reuseaddr(&fd, true).map_err(|e| SetupError::os("SO_REUSEADDR", e))?;
        sockopt::set_ipv6_multicast_loop(&fd, false)
            .map_err(|e| SetupError::os("IPV6_MULTICAST_LOOP", e))?;
        sockopt::set_ipv6_unicast_hops(&fd, Some(LINK_LOCAL_HOPS))
            .map_err(|e| SetupError::os("IPV6_UNICAST_HOPS", e))?;
        sockopt::set_ipv6_multicast_hops(&fd, u32::from(LINK_LOCAL_HOPS))
            .map_err(|e| SetupError::os("IPV6_MULTICAST_HOPS", e))?;

        // QoS marking only; not required for correctness.
        if sockopt::set_ipv6_tclass(&fd, TCLASS_INTERNET_CONTROL).is_err() {
            warn!("IPV6_TCLASS not applied; sending unmarked");
        }

        set_nonblocking(&fd).map_err(|e| SetupError::os("O_NONBLOCK", e))?;
        set_cloexec(&fd).map_err(|e| SetupError::os("FD_CLOEXEC", e))?;

        net::bind_v6(&fd, &Endpoint::any(port).as_socket_addr())
            .map_err(|e| SetupError::os("bind", e))?;

        debug!("protocol socket bound to [::]:{port}");
        Ok(Self { fd })
    }

    /// Returns the local address this socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be retrieved.
    pub fn local_addr(&self) -> io::Result<Endpoint> {
        match net::getsockname(&self.fd)? {
            SocketAddrAny::V6(v6) => Ok(Endpoint::from(v6)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "protocol socket has a non-IPv6 local address",
            )),
        }
    }

    /// Receives one datagram into `buf`, returning the byte count and
    /// the sender's endpoint.
    ///
    /// Single pass through the kernel with no retry: call this only
    /// after the event loop has reported the socket readable,
    /// otherwise it returns `WouldBlock`. A zero-length datagram
    /// yields `Ok((0, sender))`, not an error.
    ///
    /// # Errors
    ///
    /// Every receive failure, including `WouldBlock`, surfaces
    /// verbatim with the OS error code intact.
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Endpoint)> {
        let (len, addr) = net::recvfrom(&self.fd, buf, RecvFlags::empty())?;
        match addr {
            Some(SocketAddrAny::V6(v6)) => Ok((len, Endpoint::from(v6))),
            // The socket is v6only; the kernel always reports an IPv6 source.
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "datagram without an IPv6 source address",
            )),
        }
    }

    /// Attempts to receive, returning `Ok(None)` instead of `WouldBlock`.
    ///
    /// Useful in polling loops where `WouldBlock` is expected.
    pub fn try_recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, Endpoint)>> {
        match self.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sends `header` and `body` as a single datagram to `dest`.
    ///
    /// The two segments go to the kernel as a scatter-gather pair, so
    /// the message layer composes a packet header and TLV body without
    /// concatenating buffers.
    ///
    /// Transient conditions are absorbed here rather than surfaced: an
    /// interrupted call retries immediately, and a full send buffer
    /// waits up to five seconds for the socket to become writable
    /// before retrying. If the buffer never drains the call
    /// fails with `WouldBlock` instead of blocking the event loop for
    /// good.
    ///
    /// # Errors
    ///
    /// `WouldBlock` when the send buffer stayed full past the wait
    /// ceiling; any other OS failure propagates unmodified.
    pub fn send_split(&self, header: &[u8], body: &[u8], dest: Endpoint) -> io::Result<usize> {
        let addr = dest.as_socket_addr();
        send_with_retry(
            || {
                let segments = [IoSlice::new(header), IoSlice::new(body)];
                let mut control = SendAncillaryBuffer::default();
                net::sendmsg_v6(&self.fd, &addr, &segments, &mut control, SendFlags::empty())
            },
            || wait_ready(self.fd.as_fd(), PollFlags::OUT, SEND_READY_TIMEOUT),
        )
    }
}

/// Drives one datagram send through the transient-failure policy.
///
/// Three states: attempt the send, wait for writability after a full
/// send buffer, done or failed. An interrupted attempt retries
/// immediately with no bound; a would-block attempt retries only once
/// the wait reports the socket writable. A wait that times out or
/// fails ends the send with `WouldBlock`, so the caller sees the
/// original condition rather than the wait's own outcome. Any other
/// attempt failure propagates unmodified.
fn send_with_retry<S, W>(mut attempt: S, mut wait: W) -> io::Result<usize>
where
    S: FnMut() -> Result<usize, Errno>,
    W: FnMut() -> Result<Readiness, Errno>,
{
    loop {
        match attempt() {
            Ok(sent) => return Ok(sent),
            Err(e) if e == Errno::INTR => {
                trace!("send interrupted, retrying");
            }
            Err(e) if e == Errno::AGAIN || e == Errno::WOULDBLOCK => match wait() {
                Ok(Readiness::Ready) => {
                    trace!("socket writable again, retrying send");
                }
                Ok(Readiness::TimedOut) | Err(_) => {
                    debug!("send buffer stayed full past ceiling, giving up");
                    return Err(Errno::AGAIN.into());
                }
            },
            Err(e) => return Err(e.into()),
        }
    }
}

impl AsFd for ProtocolSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for ProtocolSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl Source for ProtocolSocket {
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
