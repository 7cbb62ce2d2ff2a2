use std::net::SocketAddr;

use serde::Serialize;

/// Which side of the connection produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Sender,
    Receiver,
}

/// Why a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The peer closed the connection between frames.
    PeerClosed,
    /// A local stop was requested (Ctrl-C).
    QuitRequested,
    /// The configured frame count was reached.
    FrameLimit,
    /// The image source ran out of images.
    SourceExhausted,
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub role: Role,
    pub peer: Option<SocketAddr>,
    /// Frames transferred over the connection.
    pub frames: u64,
    /// Payload bytes transferred, headers excluded.
    pub payload_bytes: u64,
    /// Images skipped after a codec or display failure.
    pub skipped: u64,
    pub end: SessionEnd,
}

impl SessionReport {
    pub(crate) fn new(role: Role, peer: Option<SocketAddr>) -> Self {
        let end = match role {
            Role::Sender => SessionEnd::SourceExhausted,
            Role::Receiver => SessionEnd::PeerClosed,
        };
        Self {
            role,
            peer,
            frames: 0,
            payload_bytes: 0,
            skipped: 0,
            end,
        }
    }

    pub(crate) fn record_frame(&mut self, payload_len: usize) {
        self.frames += 1;
        self.payload_bytes += payload_len as u64;
    }
}
