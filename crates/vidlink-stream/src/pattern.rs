use image::{Rgb, RgbImage};

use crate::error::MediaError;
use crate::media::{Capture, ImageSource};

const BARS: [[u8; 3]; 8] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
    [16, 16, 16],
];

/// Pixels the bars move per frame.
const SCROLL_STEP: u64 = 4;

#[derive(Debug, Clone)]
pub struct TestPatternConfig {
    pub width: u32,
    pub height: u32,
    /// Stop after this many images when set.
    pub frame_limit: Option<u64>,
}

impl Default for TestPatternConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frame_limit: None,
        }
    }
}

/// Synthetic camera: scrolling colour bars with a frame counter strip.
#[derive(Debug)]
pub struct TestPattern {
    config: TestPatternConfig,
    produced: u64,
}

impl TestPattern {
    pub fn new(config: TestPatternConfig) -> Result<Self, MediaError> {
        if config.width == 0 || config.height == 0 {
            return Err(MediaError::InvalidDimensions {
                width: config.width,
                height: config.height,
            });
        }
        Ok(Self {
            config,
            produced: 0,
        })
    }

    /// Images produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    fn render(&self) -> RgbImage {
        let TestPatternConfig { width, height, .. } = self.config;
        let offset = (self.produced.wrapping_mul(SCROLL_STEP) % u64::from(width)) as u32;
        let bar_width = (width / BARS.len() as u32).max(1);
        let strip = height / 8;
        let counter = self.produced;

        RgbImage::from_fn(width, height, |x, y| {
            if y >= height - strip {
                // Binary frame counter, one cell per bit, most significant left.
                let cell = (width / 32).max(1);
                let bit = 31u32.saturating_sub(x / cell);
                let on = (counter >> bit) & 1 == 1;
                return if on { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) };
            }
            let shifted = (x + offset) % width;
            let index = ((shifted / bar_width) as usize).min(BARS.len() - 1);
            Rgb(BARS[index])
        })
    }
}

impl ImageSource for TestPattern {
    fn capture(&mut self) -> Capture {
        if let Some(limit) = self.config.frame_limit {
            if self.produced >= limit {
                return Capture::Exhausted;
            }
        }
        let image = self.render();
        self.produced += 1;
        Capture::Image(image)
    }
}
