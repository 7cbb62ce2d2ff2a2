use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use crate::error::{Result, TransportError};

/// IPv4 any-address sentinel.
pub const IPV4_ANY: &str = "0.0.0.0";

/// IPv6 any-address sentinel.
pub const IPV6_ANY: &str = "::";

/// Address family of a textual address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Classify an address string. The presence of `:` is the sole discriminator.
    pub fn classify(addr: &str) -> Self {
        if addr.contains(':') {
            Self::V6
        } else {
            Self::V4
        }
    }

    /// The any-address sentinel for this family.
    pub fn any_sentinel(self) -> &'static str {
        match self {
            Self::V4 => IPV4_ANY,
            Self::V6 => IPV6_ANY,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
        }
    }
}

/// A resolved TCP endpoint, tagged by address family.
///
/// Built once per address by [`Endpoint::parse`]; connect, bind, and accept
/// dispatch on the tag instead of re-inspecting the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    V4(SocketAddrV4),
    V6(SocketAddrV6),
}

impl Endpoint {
    /// Resolve a textual address and port.
    ///
    /// The family comes from [`AddressFamily::classify`]. The family's
    /// any-address sentinel maps to the unspecified address; any other string
    /// must parse as a literal of that family.
    pub fn parse(addr: &str, port: u16) -> Result<Self> {
        let family = AddressFamily::classify(addr);
        let invalid = || TransportError::InvalidAddress {
            input: addr.to_string(),
            family,
        };
        let any = addr == family.any_sentinel();

        match family {
            AddressFamily::V4 => {
                let ip = if any {
                    Ipv4Addr::UNSPECIFIED
                } else {
                    addr.parse::<Ipv4Addr>().map_err(|_| invalid())?
                };
                Ok(Self::V4(SocketAddrV4::new(ip, port)))
            }
            AddressFamily::V6 => {
                let ip = if any {
                    Ipv6Addr::UNSPECIFIED
                } else {
                    addr.parse::<Ipv6Addr>().map_err(|_| invalid())?
                };
                Ok(Self::V6(SocketAddrV6::new(ip, port, 0, 0)))
            }
        }
    }

    pub fn family(&self) -> AddressFamily {
        match self {
            Self::V4(_) => AddressFamily::V4,
            Self::V6(_) => AddressFamily::V6,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Self::V4(addr) => addr.port(),
            Self::V6(addr) => addr.port(),
        }
    }

    /// True when this endpoint means "all interfaces".
    pub fn is_any(&self) -> bool {
        match self {
            Self::V4(addr) => addr.ip().is_unspecified(),
            Self::V6(addr) => addr.ip().is_unspecified(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        match *self {
            Self::V4(addr) => SocketAddr::V4(addr),
            Self::V6(addr) => SocketAddr::V6(addr),
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(addr) => Self::V4(addr),
            SocketAddr::V6(addr) => Self::V6(addr),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
