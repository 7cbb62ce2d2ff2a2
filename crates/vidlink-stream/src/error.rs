/// Errors from image collaborators (capture, codec, display).
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The image codec rejected the data.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem or device I/O failed.
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested image dimensions cannot be produced.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Errors that end a sender or receiver session.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Transport-level error (address, bind, connect, accept).
    #[error("transport error: {0}")]
    Transport(#[from] vidlink_transport::TransportError),

    /// Frame-level error on an established connection.
    #[error("frame error: {0}")]
    Frame(#[from] vidlink_frame::FrameError),

    /// Collaborator setup failed.
    #[error("media error: {0}")]
    Media(#[from] MediaError),
}

pub type Result<T> = std::result::Result<T, StreamError>;
