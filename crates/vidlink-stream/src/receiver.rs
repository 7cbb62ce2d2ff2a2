use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::ops::{Deref, DerefMut};

use tracing::{debug, error, info, warn};
use vidlink_frame::{FrameError, FrameReader};
use vidlink_transport::{Endpoint, TcpEndpointListener};

use crate::config::StreamConfig;
use crate::error::Result;
use crate::media::{DisplaySink, ImageDecoder};
use crate::report::{Role, SessionEnd, SessionReport};

/// A receiver bound and listening, waiting for its single client.
#[derive(Debug)]
pub struct Receiver {
    listener: TcpEndpointListener,
    config: StreamConfig,
}

impl Receiver {
    /// Bind and listen on `endpoint`.
    pub fn bind(endpoint: &Endpoint, config: StreamConfig) -> Result<Self> {
        let listener = TcpEndpointListener::bind(endpoint)?;
        Ok(Self { listener, config })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for one client. Only the first connection is ever served.
    pub fn accept(self) -> Result<Session<TcpStream>> {
        info!(addr = %self.listener.endpoint(), "waiting for connection");
        let (stream, peer) = self.listener.accept()?;
        vidlink_transport::set_timeouts(&stream, self.config.frame.read_timeout, None)?;
        let reader = FrameReader::with_config(stream, self.config.frame.clone());
        info!(%peer, "client connected");
        Ok(Session {
            reader,
            listener: Some(self.listener),
            peer: Some(peer),
            config: self.config,
        })
    }
}

/// A connected receiving session.
///
/// The listening socket stays open (but unused) until the session ends.
pub struct Session<R> {
    reader: FrameReader<R>,
    listener: Option<TcpEndpointListener>,
    peer: Option<SocketAddr>,
    config: StreamConfig,
}

impl<R> Session<R> {
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl<R: Read> Session<R> {
    /// Serve frames from an already connected stream.
    pub fn from_reader(inner: R, config: StreamConfig) -> Self {
        Self {
            reader: FrameReader::with_config(inner, config.frame.clone()),
            listener: None,
            peer: None,
            config,
        }
    }

    /// Receive, decode, and present frames until the stream ends.
    ///
    /// A close before a payload starts, a quit request, or reaching
    /// `max_frames` ends the session normally. Protocol violations and
    /// connection failures end it with an error. Decode and display
    /// failures skip the frame. The sink is closed exactly once either way.
    pub fn run<D, S>(self, decoder: &mut D, sink: &mut S) -> Result<SessionReport>
    where
        D: ImageDecoder + ?Sized,
        S: DisplaySink + ?Sized,
    {
        let Self {
            mut reader,
            listener: _listener,
            peer,
            config,
        } = self;
        let mut sink = SinkGuard(sink);
        let mut report = SessionReport::new(Role::Receiver, peer);

        loop {
            if config.max_frames.is_some_and(|max| report.frames >= max) {
                info!(frames = report.frames, "frame limit reached");
                report.end = SessionEnd::FrameLimit;
                break;
            }

            let frame = match reader.read_frame() {
                Ok(frame) => frame,
                Err(err) if err.is_end_of_stream() => {
                    if let FrameError::Truncated { received, .. } = err {
                        warn!(
                            received,
                            frames = report.frames,
                            "connection closed inside header"
                        );
                    }
                    info!(frames = report.frames, "peer closed connection");
                    report.end = SessionEnd::PeerClosed;
                    break;
                }
                Err(err) => {
                    log_read_failure(&err, report.frames);
                    return Err(err.into());
                }
            };
            report.record_frame(frame.payload.len());
            debug!(
                index = report.frames,
                width = frame.width,
                height = frame.height,
                length = frame.payload.len(),
                "frame received"
            );

            match decoder.decode(&frame.payload) {
                Ok(image) => {
                    if let Err(err) = sink.present(&image) {
                        warn!(error = %err, "failed to present frame");
                        report.skipped += 1;
                    }
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        length = frame.payload.len(),
                        "failed to decode frame; skipping"
                    );
                    report.skipped += 1;
                }
            }

            if sink.quit_requested() {
                info!(frames = report.frames, "quit requested");
                report.end = SessionEnd::QuitRequested;
                break;
            }
        }

        Ok(report)
    }
}

fn log_read_failure(err: &FrameError, frames: u64) {
    match err {
        FrameError::PayloadTooLarge { size, max } => {
            error!(size, max, frames, "protocol violation: frame length exceeds cap");
        }
        FrameError::Truncated {
            section,
            expected,
            received,
        } => {
            warn!(%section, expected, received, frames, "connection closed mid-frame");
        }
        other => {
            error!(error = %other, frames, "receive failed");
        }
    }
}

/// Closes the display when the session ends, on every path.
struct SinkGuard<'a, S: DisplaySink + ?Sized>(&'a mut S);

impl<S: DisplaySink + ?Sized> Deref for SinkGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.0
    }
}

impl<S: DisplaySink + ?Sized> DerefMut for SinkGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.0
    }
}

impl<S: DisplaySink + ?Sized> Drop for SinkGuard<'_, S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::time::Duration;

    use bytes::BytesMut;
    use image::RgbImage;
    use vidlink_frame::{encode_frame, FrameConfig, FrameSection};

    use super::*;
    use crate::error::{MediaError, StreamError};

    fn wire(frames: &[(u32, u32, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (width, height, payload) in frames {
            encode_frame(*width, *height, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    /// "Decodes" a payload into a 1-row image whose width is the payload length.
    #[derive(Default)]
    struct LengthDecoder {
        calls: usize,
        fail_on_empty: bool,
    }

    impl ImageDecoder for LengthDecoder {
        fn decode(&mut self, data: &[u8]) -> std::result::Result<RgbImage, MediaError> {
            self.calls += 1;
            if data.is_empty() && self.fail_on_empty {
                return Err(MediaError::InvalidDimensions {
                    width: 0,
                    height: 0,
                });
            }
            Ok(RgbImage::new(data.len() as u32, 1))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        widths: Vec<u32>,
        closed: usize,
        quit_after: Option<usize>,
    }

    impl DisplaySink for RecordingSink {
        fn present(&mut self, image: &RgbImage) -> std::result::Result<(), MediaError> {
            self.widths.push(image.width());
            Ok(())
        }

        fn quit_requested(&mut self) -> bool {
            self.quit_after.is_some_and(|n| self.widths.len() >= n)
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    /// Counts how many times the connection is released.
    struct DropCounted<R> {
        inner: R,
        drops: Rc<Cell<usize>>,
    }

    impl<R: Read> Read for DropCounted<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl<R> Drop for DropCounted<R> {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    struct ByteByByte(Cursor<Vec<u8>>);

    impl Read for ByteByByte {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    fn session(bytes: Vec<u8>, drops: &Rc<Cell<usize>>) -> Session<DropCounted<Cursor<Vec<u8>>>> {
        let reader = DropCounted {
            inner: Cursor::new(bytes),
            drops: Rc::clone(drops),
        };
        Session::from_reader(reader, StreamConfig::default())
    }

    #[test]
    fn presents_frames_in_order_until_peer_closes() {
        let drops = Rc::new(Cell::new(0));
        let bytes = wire(&[
            (100, 1, vec![1u8; 100].as_slice()),
            (0, 0, b"".as_slice()),
            (5000, 1, vec![2u8; 5000].as_slice()),
        ]);
        let mut decoder = LengthDecoder::default();
        let mut sink = RecordingSink::default();

        let report = session(bytes, &drops).run(&mut decoder, &mut sink).unwrap();

        assert_eq!(report.role, Role::Receiver);
        assert_eq!(report.frames, 3);
        assert_eq!(report.payload_bytes, 5100);
        assert_eq!(report.end, SessionEnd::PeerClosed);
        assert_eq!(sink.widths, vec![100, 0, 5000]);
        assert_eq!(sink.closed, 1);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn decode_failure_skips_frame_and_continues() {
        let drops = Rc::new(Cell::new(0));
        let bytes = wire(&[(1, 1, b"".as_slice()), (3, 1, b"abc".as_slice())]);
        let mut decoder = LengthDecoder {
            fail_on_empty: true,
            ..LengthDecoder::default()
        };
        let mut sink = RecordingSink::default();

        let report = session(bytes, &drops).run(&mut decoder, &mut sink).unwrap();

        assert_eq!(report.frames, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(sink.widths, vec![3]);
    }

    #[test]
    fn mid_frame_close_is_an_error_and_releases_everything() {
        let drops = Rc::new(Cell::new(0));
        let mut bytes = wire(&[(4, 1, b"full".as_slice()), (10, 1, [9u8; 10].as_slice())]);
        bytes.truncate(bytes.len() - 3);
        let mut decoder = LengthDecoder::default();
        let mut sink = RecordingSink::default();

        let err = session(bytes, &drops)
            .run(&mut decoder, &mut sink)
            .unwrap_err();

        assert!(matches!(
            err,
            StreamError::Frame(FrameError::Truncated {
                section: FrameSection::Payload,
                expected: 10,
                received: 7,
            })
        ));
        assert_eq!(sink.widths, vec![4]);
        assert_eq!(sink.closed, 1);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn partial_header_at_close_ends_session_cleanly() {
        let drops = Rc::new(Cell::new(0));
        let mut bytes = wire(&[(1, 1, b"ok".as_slice())]);
        bytes.extend_from_slice(&[0x80, 0x02, 0x00, 0x00, 0xE0]);
        let mut decoder = LengthDecoder::default();
        let mut sink = RecordingSink::default();

        let report = session(bytes, &drops).run(&mut decoder, &mut sink).unwrap();

        assert_eq!(report.end, SessionEnd::PeerClosed);
        assert_eq!(report.frames, 1);
        assert_eq!(report.payload_bytes, 2);
        assert_eq!(sink.widths, vec![2]);
        assert_eq!(sink.closed, 1);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn accept_applies_read_timeout() {
        let config = StreamConfig {
            frame: FrameConfig {
                read_timeout: Some(Duration::from_millis(150)),
                ..FrameConfig::default()
            },
            ..StreamConfig::default()
        };
        let receiver = Receiver::bind(&Endpoint::parse("127.0.0.1", 0).unwrap(), config).unwrap();
        let addr = receiver.local_addr().unwrap();
        let client = std::thread::spawn(move || TcpStream::connect(addr).unwrap());

        let session = receiver.accept().unwrap();
        let _client = client.join().unwrap();

        assert_eq!(
            session.reader.get_ref().read_timeout().unwrap(),
            Some(Duration::from_millis(150))
        );
        let err = session
            .run(&mut LengthDecoder::default(), &mut RecordingSink::default())
            .unwrap_err();
        assert!(matches!(err, StreamError::Frame(FrameError::Io(_))));
    }

    #[test]
    fn oversize_length_is_rejected_before_decoding() {
        let drops = Rc::new(Cell::new(0));
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&640u32.to_le_bytes());
        bytes.extend_from_slice(&480u32.to_le_bytes());
        bytes.extend_from_slice(&(10 * 1024 * 1024 + 1u32).to_le_bytes());
        let mut decoder = LengthDecoder::default();
        let mut sink = RecordingSink::default();

        let err = session(bytes, &drops)
            .run(&mut decoder, &mut sink)
            .unwrap_err();

        match err {
            StreamError::Frame(ref frame_err) => assert!(frame_err.is_protocol_violation()),
            other => panic!("expected frame error, got {other:?}"),
        }
        assert_eq!(decoder.calls, 0);
        assert_eq!(sink.closed, 1);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn byte_by_byte_delivery_yields_same_frames() {
        let bytes = wire(&[
            (2, 1, b"hi".as_slice()),
            (1500, 1, vec![5u8; 1500].as_slice()),
        ]);
        let mut decoder = LengthDecoder::default();
        let mut sink = RecordingSink::default();

        let report = Session::from_reader(ByteByByte(Cursor::new(bytes)), StreamConfig::default())
            .run(&mut decoder, &mut sink)
            .unwrap();

        assert_eq!(report.frames, 2);
        assert_eq!(sink.widths, vec![2, 1500]);
    }

    #[test]
    fn quit_request_stops_after_current_frame() {
        let drops = Rc::new(Cell::new(0));
        let bytes = wire(&[(1, 1, b"a".as_slice()), (1, 1, b"b".as_slice())]);
        let mut decoder = LengthDecoder::default();
        let mut sink = RecordingSink {
            quit_after: Some(1),
            ..RecordingSink::default()
        };

        let report = session(bytes, &drops).run(&mut decoder, &mut sink).unwrap();

        assert_eq!(report.end, SessionEnd::QuitRequested);
        assert_eq!(report.frames, 1);
        assert_eq!(sink.closed, 1);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn frame_limit_ends_session() {
        let bytes = wire(&[
            (1, 1, b"a".as_slice()),
            (1, 1, b"b".as_slice()),
            (1, 1, b"c".as_slice()),
        ]);
        let config = StreamConfig {
            max_frames: Some(2),
            ..StreamConfig::default()
        };
        let mut decoder = LengthDecoder::default();
        let mut sink = RecordingSink::default();

        let report = Session::from_reader(Cursor::new(bytes), config)
            .run(&mut decoder, &mut sink)
            .unwrap();

        assert_eq!(report.end, SessionEnd::FrameLimit);
        assert_eq!(report.frames, 2);
        assert_eq!(decoder.calls, 2);
    }

    #[test]
    fn configured_cap_applies_to_session() {
        let bytes = wire(&[(8, 1, [0u8; 8].as_slice())]);
        let config = StreamConfig {
            frame: FrameConfig {
                max_payload_size: 4,
                ..FrameConfig::default()
            },
            ..StreamConfig::default()
        };
        let mut sink = RecordingSink::default();

        let err = Session::from_reader(Cursor::new(bytes), config)
            .run(&mut LengthDecoder::default(), &mut sink)
            .unwrap_err();

        assert!(matches!(
            err,
            StreamError::Frame(FrameError::PayloadTooLarge { size: 8, max: 4 })
        ));
    }
}
