use std::fmt;

/// Part of a frame being transferred when the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSection {
    Header,
    Payload,
}

impl fmt::Display for FrameSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Payload => f.write_str("payload"),
        }
    }
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload length exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection on a frame boundary.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer closed the connection part-way through a frame.
    #[error("connection closed during frame {section} ({received} of {expected} bytes)")]
    Truncated {
        section: FrameSection,
        expected: usize,
        received: usize,
    },
}

impl FrameError {
    /// True when the peer closed before a frame's payload started.
    ///
    /// A close part-way through a header still ends the stream normally; only
    /// a close inside a payload is an error.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed
                | Self::Truncated {
                    section: FrameSection::Header,
                    ..
                }
        )
    }

    /// True when the peer sent something this side must not accept.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
