use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use crate::error::MediaError;
use crate::media::{ImageDecoder, ImageEncoder};

/// JPEG compression for both directions.
#[derive(Debug, Clone, Copy)]
pub struct JpegCodec {
    quality: u8,
}

impl JpegCodec {
    /// Default JPEG quality (1-100).
    pub const DEFAULT_QUALITY: u8 = 80;

    /// Quality is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUALITY)
    }
}

impl ImageEncoder for JpegCodec {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<u8>, MediaError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(MediaError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
            });
        }
        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
        image.write_with_encoder(encoder)?;
        Ok(buf.into_inner())
    }
}

impl ImageDecoder for JpegCodec {
    fn decode(&mut self, data: &[u8]) -> Result<RgbImage, MediaError> {
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
        Ok(decoded.to_rgb8())
    }
}
