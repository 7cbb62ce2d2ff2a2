//! Dual-stack TCP transport for vidlink.
//!
//! Resolves a textual address into a tagged [`Endpoint`] exactly once, then
//! dispatches on that tag for everything that follows:
//! - outbound connect for the sending side
//! - bind + listen (backlog 1) + accept for the receiving side
//!
//! This is the lowest layer of vidlink. Framing and sessions build on the
//! plain [`std::net::TcpStream`] values returned here.

pub mod endpoint;
pub mod error;
pub mod tcp;

pub use endpoint::{AddressFamily, Endpoint, IPV4_ANY, IPV6_ANY};
pub use error::{Result, TransportError};
pub use tcp::{connect, set_timeouts, TcpEndpointListener, LISTEN_BACKLOG};
