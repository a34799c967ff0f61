//! Network transport primitives.
//!
//! Socket construction and datagram I/O for the routing daemon. The
//! [`ProtocolSocket`] carries routing exchanges over UDP with strict
//! link-local scoping; the [`ControlListener`] accepts monitoring
//! connections over TCP. Both come out of their builders fully
//! configured (non-blocking, close-on-exec, bound) or not at all, and
//! both plug into the daemon's mio event loop via
//! [`mio::event::Source`].

pub mod endpoint;
pub mod error;
pub mod fd;
pub mod listener;
pub mod socket;

pub use endpoint::Endpoint;
pub use error::SetupError;
pub use listener::ControlListener;
pub use socket::ProtocolSocket;
