use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::{error, trace};

use crate::codec::{Frame, FrameConfig, FrameHeader, HEADER_SIZE, WORD_SIZE};
use crate::error::{FrameError, FrameSection, Result};

/// Reads complete frames from any `Read` stream.
///
/// Short reads are accumulated internally; callers always get complete frames.
/// Every read call asks for at most `chunk_size` bytes.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

enum Fill {
    Complete,
    Eof { received: usize },
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends cleanly
    /// between frames and `Err(FrameError::Truncated { .. })` when it ends
    /// part-way through one. Both count as end of stream while still inside
    /// the header.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let header = self.read_header()?;
        let length = header.payload_len();

        if length > self.config.max_payload_size {
            error!(
                size = length,
                max = self.config.max_payload_size,
                "frame length exceeds cap"
            );
            return Err(FrameError::PayloadTooLarge {
                size: length,
                max: self.config.max_payload_size,
            });
        }

        let payload = self.read_payload(length)?;
        trace!(
            width = header.width,
            height = header.height,
            length,
            "frame received"
        );

        Ok(Frame {
            width: header.width,
            height: header.height,
            payload,
        })
    }

    fn read_header(&mut self) -> Result<FrameHeader> {
        let mut raw = [0u8; HEADER_SIZE];
        for (index, word) in raw.chunks_exact_mut(WORD_SIZE).enumerate() {
            if let Fill::Eof { received } = self.fill(word)? {
                let received = index * WORD_SIZE + received;
                if received == 0 {
                    return Err(FrameError::ConnectionClosed);
                }
                return Err(FrameError::Truncated {
                    section: FrameSection::Header,
                    expected: HEADER_SIZE,
                    received,
                });
            }
        }
        Ok(FrameHeader::decode(&raw))
    }

    fn read_payload(&mut self, length: usize) -> Result<Bytes> {
        let mut payload = BytesMut::zeroed(length);
        if let Fill::Eof { received } = self.fill(&mut payload)? {
            return Err(FrameError::Truncated {
                section: FrameSection::Payload,
                expected: length,
                received,
            });
        }
        Ok(payload.freeze())
    }

    /// Fill `buf` completely with reads of at most `chunk_size` bytes.
    fn fill(&mut self, buf: &mut [u8]) -> Result<Fill> {
        let chunk = self.config.chunk_size.max(1);
        let mut filled = 0usize;
        while filled < buf.len() {
            let end = buf.len().min(filled + chunk);
            match self.inner.read(&mut buf[filled..end]) {
                Ok(0) => return Ok(Fill::Eof { received: filled }),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(Fill::Complete)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
