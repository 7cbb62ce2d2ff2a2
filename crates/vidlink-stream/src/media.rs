//! Collaborator contracts for image capture, compression, and display.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbImage;

use crate::error::MediaError;

/// Outcome of one capture attempt.
#[derive(Debug)]
pub enum Capture {
    /// A fresh image.
    Image(RgbImage),
    /// Nothing ready yet. The sender waits briefly and polls again.
    Empty,
    /// The source has no more images. The sender closes cleanly.
    Exhausted,
}

/// Produces raw images for the sender.
pub trait ImageSource {
    fn capture(&mut self) -> Capture;
}

/// Compresses a raw image. Failure skips that image only.
pub trait ImageEncoder {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<u8>, MediaError>;
}

/// Decompresses a received payload. Failure skips that frame only.
pub trait ImageDecoder {
    fn decode(&mut self, data: &[u8]) -> Result<RgbImage, MediaError>;
}

/// Presents decoded images and reports local stop requests.
pub trait DisplaySink {
    /// Render one image.
    fn present(&mut self, image: &RgbImage) -> Result<(), MediaError>;

    /// Non-blocking check for a local request to stop.
    fn quit_requested(&mut self) -> bool;

    /// Release display resources. Called exactly once when a session ends.
    fn close(&mut self) {}
}

/// Shared stop flag, set from a signal handler or another thread.
#[derive(Debug, Clone, Default)]
pub struct QuitSignal {
    requested: Arc<AtomicBool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to stop at the next frame boundary.
    ///
    /// Returns `true` if a stop had already been requested.
    pub fn request(&self) -> bool {
        self.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
