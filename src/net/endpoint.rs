//! Network endpoint types.
//!
//! The routing protocol is IPv6-only, so the endpoint wraps
//! [`SocketAddrV6`] rather than the address-family-agnostic
//! [`SocketAddr`]: the constraint lives in the type instead of a
//! runtime check at every send.

use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};

/// An IPv6 network endpoint (address + port, with optional scope).
///
/// Destinations on the protocol socket are typically the link-local
/// all-routers multicast group or a neighbor's link-local unicast
/// address; both need an interface index as scope identifier, which
/// [`Endpoint::new_scoped`] carries through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(SocketAddrV6);

impl Endpoint {
    /// Creates a new endpoint from an address and port, with no scope.
    #[must_use]
    pub const fn new(addr: Ipv6Addr, port: u16) -> Self {
        Self(SocketAddrV6::new(addr, port, 0, 0))
    }

    /// Creates an endpoint with an explicit scope identifier
    /// (interface index). Required for link-local destinations.
    #[must_use]
    pub const fn new_scoped(addr: Ipv6Addr, port: u16, scope_id: u32) -> Self {
        Self(SocketAddrV6::new(addr, port, 0, scope_id))
    }

    /// Creates an endpoint on the wildcard address `::` at the given port.
    #[must_use]
    pub const fn any(port: u16) -> Self {
        Self::new(Ipv6Addr::UNSPECIFIED, port)
    }

    /// Creates a loopback (`::1`) endpoint on the given port.
    #[must_use]
    pub const fn localhost(port: u16) -> Self {
        Self::new(Ipv6Addr::LOCALHOST, port)
    }

    /// Returns the IP address.
    #[must_use]
    pub const fn ip(&self) -> Ipv6Addr {
        *self.0.ip()
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.0.port()
    }

    /// Returns the scope identifier (0 when unscoped).
    #[must_use]
    pub const fn scope_id(&self) -> u32 {
        self.0.scope_id()
    }

    /// Returns the underlying [`SocketAddrV6`].
    #[must_use]
    pub const fn as_socket_addr(&self) -> SocketAddrV6 {
        self.0
    }
}

impl From<SocketAddrV6> for Endpoint {
    fn from(addr: SocketAddrV6) -> Self {
        Self(addr)
    }
}

impl From<Endpoint> for SocketAddrV6 {
    fn from(ep: Endpoint) -> Self {
        ep.0
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(ep: Endpoint) -> Self {
        SocketAddr::V6(ep.0)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
