//! Transport layer for a link-local distance-vector routing daemon.
//!
//! This crate owns the sockets the daemon runs on and nothing else:
//! it builds the UDP protocol socket that carries routing exchanges
//! between directly connected neighbors, builds the TCP listener for
//! the local monitoring channel, and provides the receive and send
//! primitives that absorb transient kernel conditions (interrupted
//! calls, full send buffers) without dropping or corrupting traffic.
//!
//! Message encoding, neighbor state, route selection, and the event
//! loop itself all live above this crate; they consume the handles and
//! byte buffers produced here. Both socket types implement
//! [`mio::event::Source`], so the daemon registers them with its
//! [`mio::Poll`] for readiness notification.

pub mod net;
pub mod trace;

pub use net::{ControlListener, Endpoint, ProtocolSocket, SetupError};
pub use trace::init_tracing;
