//! Video frame framing for vidlink.
//!
//! Every frame on the wire is a fixed 12-byte header followed by its payload:
//! - width, height, length as three little-endian `u32` words
//! - exactly `length` bytes of opaque compressed image data
//!
//! Reads and writes go through bounded chunks and tolerate arbitrary short
//! transfers, so callers always see whole frames.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, FrameHeader, CHUNK_SIZE, HEADER_SIZE,
    MAX_FRAME_LEN, WORD_SIZE,
};
pub use error::{FrameError, FrameSection, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
