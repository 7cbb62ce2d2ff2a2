use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, error, info, warn};
use vidlink_frame::{FrameError, FrameWriter};
use vidlink_transport::Endpoint;

use crate::config::StreamConfig;
use crate::error::Result;
use crate::media::{Capture, ImageEncoder, ImageSource};
use crate::report::{Role, SessionReport};

/// The sending side of a stream.
///
/// Owns the connection for its whole lifetime. There is no reconnection:
/// once [`Sender::run`] returns, the connection is gone.
pub struct Sender<W> {
    writer: FrameWriter<W>,
    peer: Option<SocketAddr>,
    config: StreamConfig,
}

impl Sender<TcpStream> {
    /// Connect to a receiver (blocking, no retry).
    pub fn connect(endpoint: &Endpoint, config: StreamConfig) -> Result<Self> {
        let stream = vidlink_transport::connect(endpoint)?;
        vidlink_transport::set_timeouts(&stream, None, config.frame.write_timeout)?;
        let writer = FrameWriter::with_config(stream, config.frame.clone());
        info!(addr = %endpoint, family = %endpoint.family(), "connected to receiver");
        Ok(Self {
            writer,
            peer: Some(endpoint.socket_addr()),
            config,
        })
    }
}

impl<W: Write> Sender<W> {
    /// Wrap an already connected stream.
    pub fn from_writer(inner: W, config: StreamConfig) -> Self {
        Self {
            writer: FrameWriter::with_config(inner, config.frame.clone()),
            peer: None,
            config,
        }
    }

    /// Stream images until the source is exhausted or the connection fails.
    ///
    /// Empty captures and encode failures are skipped. Any transmission
    /// error ends the session and is returned.
    pub fn run<S, E>(mut self, source: &mut S, encoder: &mut E) -> Result<SessionReport>
    where
        S: ImageSource + ?Sized,
        E: ImageEncoder + ?Sized,
    {
        let mut report = SessionReport::new(Role::Sender, self.peer);

        loop {
            let image = match source.capture() {
                Capture::Image(image) => image,
                Capture::Empty => {
                    pause(self.config.empty_backoff);
                    continue;
                }
                Capture::Exhausted => {
                    info!(frames = report.frames, "source exhausted; closing connection");
                    break;
                }
            };

            let payload = match encoder.encode(&image) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "failed to encode frame; skipping");
                    report.skipped += 1;
                    continue;
                }
            };

            match self.writer.send(image.width(), image.height(), &payload) {
                Ok(()) => {}
                // Rejected before any byte was written, so the stream is still aligned.
                Err(FrameError::PayloadTooLarge { size, max }) => {
                    warn!(size, max, "encoded frame exceeds cap; skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    error!(
                        error = %err,
                        frames = report.frames,
                        "transmission failed; closing connection"
                    );
                    return Err(err.into());
                }
            }

            report.record_frame(payload.len());
            debug!(
                index = report.frames,
                width = image.width(),
                height = image.height(),
                length = payload.len(),
                "frame sent"
            );

            pause(self.config.frame_interval);
        }

        Ok(report)
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::ErrorKind;

    use bytes::BytesMut;
    use image::RgbImage;
    use vidlink_frame::{decode_frame, FrameConfig, MAX_FRAME_LEN};

    use super::*;
    use crate::error::{MediaError, StreamError};
    use crate::report::SessionEnd;

    fn fast_config() -> StreamConfig {
        StreamConfig {
            frame_interval: Duration::ZERO,
            empty_backoff: Duration::ZERO,
            ..StreamConfig::default()
        }
    }

    struct ScriptedSource {
        script: VecDeque<Capture>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Capture>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl ImageSource for ScriptedSource {
        fn capture(&mut self) -> Capture {
            self.script.pop_front().unwrap_or(Capture::Exhausted)
        }
    }

    /// Emits queued payloads; `None` simulates an encoder failure.
    struct ScriptedEncoder {
        outputs: VecDeque<Option<Vec<u8>>>,
    }

    impl ImageEncoder for ScriptedEncoder {
        fn encode(&mut self, image: &RgbImage) -> std::result::Result<Vec<u8>, MediaError> {
            match self.outputs.pop_front().flatten() {
                Some(payload) => Ok(payload),
                None => Err(MediaError::InvalidDimensions {
                    width: image.width(),
                    height: image.height(),
                }),
            }
        }
    }

    fn image(width: u32, height: u32) -> Capture {
        Capture::Image(RgbImage::new(width, height))
    }

    fn decode_all(bytes: &[u8]) -> Vec<vidlink_frame::Frame> {
        let mut wire = BytesMut::from(bytes);
        let mut frames = Vec::new();
        while let Some(frame) = decode_frame(&mut wire, MAX_FRAME_LEN).unwrap() {
            frames.push(frame);
        }
        assert!(wire.is_empty());
        frames
    }

    #[test]
    fn streams_until_source_exhausted() {
        let mut source = ScriptedSource::new(vec![image(640, 480), image(320, 240)]);
        let mut encoder = ScriptedEncoder {
            outputs: VecDeque::from(vec![Some(vec![1; 100]), Some(vec![2; 5000])]),
        };
        let mut sink = Vec::new();

        let report = Sender::from_writer(&mut sink, fast_config())
            .run(&mut source, &mut encoder)
            .unwrap();

        assert_eq!(report.role, Role::Sender);
        assert_eq!(report.frames, 2);
        assert_eq!(report.payload_bytes, 5100);
        assert_eq!(report.end, SessionEnd::SourceExhausted);

        let frames = decode_all(&sink);
        assert_eq!(frames.len(), 2);
        assert_eq!((frames[0].width, frames[0].height), (640, 480));
        assert_eq!(frames[0].payload.as_ref(), vec![1u8; 100].as_slice());
        assert_eq!((frames[1].width, frames[1].height), (320, 240));
        assert_eq!(frames[1].payload.len(), 5000);
    }

    #[test]
    fn empty_captures_and_encode_failures_are_skipped() {
        let mut source = ScriptedSource::new(vec![
            Capture::Empty,
            image(8, 8),
            Capture::Empty,
            image(16, 16),
            image(32, 32),
        ]);
        let mut encoder = ScriptedEncoder {
            outputs: VecDeque::from(vec![Some(b"a".to_vec()), None, Some(b"c".to_vec())]),
        };
        let mut sink = Vec::new();
        let sender = Sender::from_writer(&mut sink, fast_config());

        let report = sender.run(&mut source, &mut encoder).unwrap();

        assert_eq!(report.frames, 2);
        assert_eq!(report.skipped, 1);
        let frames = decode_all(&sink);
        assert_eq!(frames[0].width, 8);
        assert_eq!(frames[1].width, 32);
    }

    #[test]
    fn oversized_encoding_is_skipped_without_writing() {
        let config = StreamConfig {
            frame: FrameConfig {
                max_payload_size: 4,
                ..FrameConfig::default()
            },
            ..fast_config()
        };
        let mut source = ScriptedSource::new(vec![image(1, 1), image(2, 2)]);
        let mut encoder = ScriptedEncoder {
            outputs: VecDeque::from(vec![Some(vec![0; 5]), Some(vec![0; 4])]),
        };
        let mut sink = Vec::new();

        let report = Sender::from_writer(&mut sink, config)
            .run(&mut source, &mut encoder)
            .unwrap();

        assert_eq!((report.frames, report.skipped), (1, 1));
        let frames = decode_all(&sink);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].width, 2);
    }

    #[test]
    fn write_failure_ends_session_with_error() {
        let mut source = ScriptedSource::new(vec![image(8, 8), image(8, 8), image(8, 8)]);
        let mut encoder = ScriptedEncoder {
            outputs: VecDeque::from(vec![Some(vec![7; 10]); 3]),
        };
        let sender = Sender::from_writer(FailAfter { budget: 30 }, fast_config());

        let err = sender.run(&mut source, &mut encoder).unwrap_err();

        assert!(matches!(
            err,
            StreamError::Frame(FrameError::Io(ref e)) if e.kind() == ErrorKind::BrokenPipe
        ));
        // Capture stops at the failing frame.
        assert_eq!(source.script.len(), 1);
    }

    #[test]
    fn connect_applies_write_timeout() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = Endpoint::from(listener.local_addr().unwrap());
        let config = StreamConfig {
            frame: FrameConfig {
                write_timeout: Some(Duration::from_millis(250)),
                ..FrameConfig::default()
            },
            ..fast_config()
        };

        let sender = Sender::connect(&endpoint, config).unwrap();
        let _server = listener.accept().unwrap();

        let stream = sender.writer.get_ref();
        assert_eq!(stream.write_timeout().unwrap(), Some(Duration::from_millis(250)));
        assert_eq!(stream.read_timeout().unwrap(), None);
        assert_eq!(sender.peer, Some(endpoint.socket_addr()));
    }

    struct FailAfter {
        budget: usize,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.budget == 0 {
                return Err(std::io::Error::from(ErrorKind::BrokenPipe));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
