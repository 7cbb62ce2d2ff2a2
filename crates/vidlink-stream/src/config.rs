use std::time::Duration;

use vidlink_frame::FrameConfig;

/// Default pause between transmitted frames (~30 frames/second).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Default pause before polling a source that had no image ready.
pub const DEFAULT_EMPTY_BACKOFF: Duration = Duration::from_millis(10);

/// Session behavior for both roles.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Framing limits and socket timeouts.
    pub frame: FrameConfig,
    /// Sender pacing after each transmitted frame.
    pub frame_interval: Duration,
    /// Sender wait after an empty capture.
    pub empty_backoff: Duration,
    /// Receiver stops after this many frames when set.
    pub max_frames: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            empty_backoff: DEFAULT_EMPTY_BACKOFF,
            max_frames: None,
        }
    }
}

impl StreamConfig {
    /// Pacing derived from a target frame rate. Zero disables pacing.
    pub fn interval_for_fps(fps: u32) -> Duration {
        if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(1000 / u64::from(fps))
        }
    }
}
