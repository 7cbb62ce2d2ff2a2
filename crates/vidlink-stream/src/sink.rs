use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, info};

use crate::error::MediaError;
use crate::jpeg::JpegCodec;
use crate::media::{DisplaySink, ImageEncoder, QuitSignal};

/// Headless display: logs each image it is handed.
#[derive(Debug)]
pub struct LogSink {
    quit: QuitSignal,
    presented: u64,
}

impl LogSink {
    pub fn new(quit: QuitSignal) -> Self {
        Self { quit, presented: 0 }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySink for LogSink {
    fn present(&mut self, image: &RgbImage) -> Result<(), MediaError> {
        self.presented += 1;
        debug!(
            index = self.presented,
            width = image.width(),
            height = image.height(),
            "frame presented"
        );
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        self.quit.is_requested()
    }

    fn close(&mut self) {
        info!(presented = self.presented, "display closed");
    }
}

/// Writes every presented image to `dir/frame-NNNNNN.jpg`.
#[derive(Debug)]
pub struct SnapshotSink {
    dir: PathBuf,
    codec: JpegCodec,
    quit: QuitSignal,
    written: u64,
}

impl SnapshotSink {
    /// Create the directory if needed.
    pub fn create(dir: impl AsRef<Path>, quit: QuitSignal) -> Result<Self, MediaError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            codec: JpegCodec::default(),
            quit,
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame-{index:06}.jpg"))
    }
}

impl DisplaySink for SnapshotSink {
    fn present(&mut self, image: &RgbImage) -> Result<(), MediaError> {
        let data = self.codec.encode(image)?;
        let path = self.path_for(self.written + 1);
        std::fs::write(&path, data)?;
        self.written += 1;
        debug!(path = %path.display(), "snapshot written");
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        self.quit.is_requested()
    }

    fn close(&mut self) {
        info!(dir = %self.dir.display(), written = self.written, "snapshots closed");
    }
}
