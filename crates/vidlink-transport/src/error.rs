use std::net::SocketAddr;

use crate::endpoint::AddressFamily;

/// Errors that can occur while resolving endpoints or establishing connections.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address string is not a valid literal for its classified family.
    #[error("invalid {family} address: {input:?}")]
    InvalidAddress {
        input: String,
        family: AddressFamily,
    },

    /// Failed to create the socket.
    #[error("socket creation failed: {0}")]
    Socket(std::io::Error),

    /// Failed to bind or listen on the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on an established socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
