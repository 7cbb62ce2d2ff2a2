use std::fmt;

use tracing::error;
use vidlink_frame::FrameError;
use vidlink_stream::{MediaError, StreamError};
use vidlink_transport::TransportError;

// Exit 1 is reserved for usage and setup failures. Once a connection exists,
// however it ends, the process exits 0.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(FAILURE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let message = match &err {
        FrameError::PayloadTooLarge { .. } => format!("{context}: protocol violation: {err}"),
        FrameError::Truncated { .. } => format!("{context}: peer disconnected: {err}"),
        _ => format!("{context}: {err}"),
    };
    CliError::new(FAILURE, message)
}

pub fn media_error(context: &str, err: MediaError) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match err {
        StreamError::Transport(err) => transport_error(context, err),
        StreamError::Frame(err) => frame_error(context, err),
        StreamError::Media(err) => media_error(context, err),
    }
}

/// Report a failure that tore down an established connection.
pub fn session_torn_down(context: &str, err: StreamError) -> i32 {
    let err = stream_error(context, err);
    error!(error = %err, "session ended by failure");
    SUCCESS
}
