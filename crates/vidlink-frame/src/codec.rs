use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Size of one header word in bytes.
pub const WORD_SIZE: usize = 4;

/// Frame header: width (4) + height (4) + length (4) = 12 bytes.
pub const HEADER_SIZE: usize = 3 * WORD_SIZE;

/// Largest payload accepted from the wire: 10 MiB.
pub const MAX_FRAME_LEN: usize = 10 * 1024 * 1024;

/// Upper bound on bytes moved per read/write call.
pub const CHUNK_SIZE: usize = 1024;

/// Fixed-size frame header.
///
/// `width` and `height` describe the source image and are carried as
/// metadata only; nothing checks them against the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    pub length: u32,
}

impl FrameHeader {
    /// The header as three little-endian words, in wire order.
    pub fn words(&self) -> [[u8; WORD_SIZE]; 3] {
        [
            self.width.to_le_bytes(),
            self.height.to_le_bytes(),
            self.length.to_le_bytes(),
        ]
    }

    /// Serialize to the 12-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        for (slot, word) in out.chunks_exact_mut(WORD_SIZE).zip(self.words()) {
            slot.copy_from_slice(&word);
        }
        out
    }

    /// Deserialize from the 12-byte wire form.
    pub fn decode(raw: &[u8; HEADER_SIZE]) -> Self {
        let word = |i: usize| {
            u32::from_le_bytes([
                raw[i * WORD_SIZE],
                raw[i * WORD_SIZE + 1],
                raw[i * WORD_SIZE + 2],
                raw[i * WORD_SIZE + 3],
            ])
        };
        Self {
            width: word(0),
            height: word(1),
            length: word(2),
        }
    }

    /// Payload length as a buffer size.
    pub fn payload_len(&self) -> usize {
        self.length as usize
    }
}

/// One encoded video image with its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
    /// Compressed image bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(width: u32, height: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            payload: payload.into(),
        }
    }

    /// Header describing this frame.
    ///
    /// Fails when the payload cannot be described by a 32-bit length.
    pub fn header(&self) -> Result<FrameHeader> {
        let length = u32::try_from(self.payload.len()).map_err(|_| FrameError::PayloadTooLarge {
            size: self.payload.len(),
            max: u32::MAX as usize,
        })?;
        Ok(FrameHeader {
            width: self.width,
            height: self.height,
            length,
        })
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬────────────┬────────────┬──────────────────┐
/// │ Width      │ Height     │ Length     │ Payload          │
/// │ (4B LE)    │ (4B LE)    │ (4B LE)    │ (Length bytes)   │
/// └────────────┴────────────┴────────────┴──────────────────┘
/// ```
pub fn encode_frame(width: u32, height: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let length = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(width);
    dst.put_u32_le(height);
    dst.put_u32_le(length);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// An oversized length is rejected as soon as the header is buffered.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut raw = [0u8; HEADER_SIZE];
    raw.copy_from_slice(&src[..HEADER_SIZE]);
    let header = FrameHeader::decode(&raw);

    if header.payload_len() > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: header.payload_len(),
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + header.payload_len();
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(header.payload_len()).freeze();

    Ok(Some(Frame {
        width: header.width,
        height: header.height,
        payload,
    }))
}

/// Configuration for frame reads and writes.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 10 MiB.
    pub max_payload_size: usize,
    /// Maximum bytes per read/write call. Default: 1024.
    pub chunk_size: usize,
    /// Read timeout for blocking operations. Default: none.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations. Default: none.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_FRAME_LEN,
            chunk_size: CHUNK_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
