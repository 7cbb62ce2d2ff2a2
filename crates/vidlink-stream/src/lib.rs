//! Sender and receiver sessions for vidlink.
//!
//! This is the "just works" layer. Each role is a small state machine whose
//! states are types:
//!
//! | role     | states                                                      |
//! |----------|-------------------------------------------------------------|
//! | sender   | [`Sender::connect`] → [`Sender::run`] (streaming) → closed  |
//! | receiver | [`Receiver::bind`] (listening) → [`Receiver::accept`] → [`Session::run`] → closed |
//!
//! `run` consumes its value, so the socket and listener are released exactly
//! once when it returns, whatever the outcome. Image capture, compression,
//! and display are collaborators behind the traits in [`media`].

pub mod config;
pub mod error;
pub mod jpeg;
pub mod media;
pub mod pattern;
pub mod receiver;
pub mod report;
pub mod sender;
pub mod sink;

pub use config::StreamConfig;
pub use error::{MediaError, Result, StreamError};
pub use jpeg::JpegCodec;
pub use media::{Capture, DisplaySink, ImageDecoder, ImageEncoder, ImageSource, QuitSignal};
pub use pattern::{TestPattern, TestPatternConfig};
pub use receiver::{Receiver, Session};
pub use report::{Role, SessionEnd, SessionReport};
pub use sender::Sender;
pub use sink::{LogSink, SnapshotSink};
