//! Descriptor configuration helpers and the readiness-wait primitive.
//!
//! Thin wrappers over fcntl and poll. Each helper applies one change
//! and reports the raw [`Errno`] on failure; the builders in
//! [`socket`](super::socket) and [`listener`](super::listener) decide
//! what is fatal.

use std::os::fd::{AsFd, BorrowedFd};
use std::time::Duration;

use rustix::event::{poll, PollFd, PollFlags};
use rustix::fs::OFlags;
use rustix::io::{Errno, FdFlags};

/// Outcome of waiting for a descriptor to become ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The requested events are available on the descriptor.
    Ready,
    /// The timeout elapsed with no readiness.
    TimedOut,
}

/// Puts the descriptor into non-blocking mode.
pub(crate) fn set_nonblocking(fd: impl AsFd) -> Result<(), Errno> {
    let flags = rustix::fs::fcntl_getfl(&fd)?;
    rustix::fs::fcntl_setfl(&fd, flags | OFlags::NONBLOCK)
}

/// Marks the descriptor close-on-exec so child processes do not
/// inherit it.
pub(crate) fn set_cloexec(fd: impl AsFd) -> Result<(), Errno> {
    let flags = rustix::io::fcntl_getfd(&fd)?;
    rustix::io::fcntl_setfd(&fd, flags | FdFlags::CLOEXEC)
}

/// Blocks the calling thread until `fd` reports one of `events` or the
/// timeout elapses.
///
/// Tri-state result: ready, timed out, or the poll itself failed.
pub fn wait_ready(
    fd: BorrowedFd<'_>,
    events: PollFlags,
    timeout: Duration,
) -> Result<Readiness, Errno> {
    let mut fds = [PollFd::from_borrowed_fd(fd, events)];
    let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    match poll(&mut fds, timeout_ms)? {
        0 => Ok(Readiness::TimedOut),
        _ => Ok(Readiness::Ready),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::os::fd::AsFd;

    #[test]
    fn nonblocking_flag_is_set() {
        let socket = UdpSocket::bind("[::1]:0").unwrap();
        set_nonblocking(&socket).unwrap();
        let flags = rustix::fs::fcntl_getfl(&socket).unwrap();
        assert!(flags.contains(OFlags::NONBLOCK));
    }

    #[test]
    fn cloexec_flag_is_set() {
        let socket = UdpSocket::bind("[::1]:0").unwrap();
        set_cloexec(&socket).unwrap();
        let flags = rustix::io::fcntl_getfd(&socket).unwrap();
        assert!(flags.contains(FdFlags::CLOEXEC));
    }

    #[test]
    fn writable_socket_is_ready_immediately() {
        let socket = UdpSocket::bind("[::1]:0").unwrap();
        let readiness =
            wait_ready(socket.as_fd(), PollFlags::OUT, Duration::from_secs(1)).unwrap();
        assert_eq!(readiness, Readiness::Ready);
    }

    #[test]
    fn silent_socket_times_out() {
        let socket = UdpSocket::bind("[::1]:0").unwrap();
        let start = std::time::Instant::now();
        let readiness =
            wait_ready(socket.as_fd(), PollFlags::IN, Duration::from_millis(50)).unwrap();
        assert_eq!(readiness, Readiness::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
