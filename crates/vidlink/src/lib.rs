//! Point-to-point video frame streaming over TCP.
//!
//! One sender connects to one receiver and pushes compressed images, each
//! wrapped in a fixed 12-byte little-endian header (width, height, length).
//!
//! # Crate Structure
//!
//! - [`transport`]: address classification and dual-stack TCP connect/listen
//! - [`frame`]: header codec and chunked frame reader/writer
//! - [`stream`]: sender and receiver sessions plus image collaborators

/// Re-export transport types.
pub mod transport {
    pub use vidlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use vidlink_frame::*;
}

/// Re-export session types.
pub mod stream {
    pub use vidlink_stream::*;
}
