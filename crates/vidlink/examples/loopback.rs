//! Run both ends of a stream in one process over IPv4 loopback.
//!
//! Run with:
//!   cargo run --example loopback
//!
//! The receiver binds an ephemeral port, a sender thread streams a short
//! JPEG test pattern to it, and both session reports are printed.

use std::thread;

use vidlink::stream::{
    JpegCodec, LogSink, QuitSignal, Receiver, Sender, SessionReport, StreamConfig, TestPattern,
    TestPatternConfig,
};
use vidlink::transport::Endpoint;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let receiver = Receiver::bind(&Endpoint::parse("127.0.0.1", 0)?, StreamConfig::default())?;
    let endpoint = Endpoint::from(receiver.local_addr()?);
    eprintln!("Listening on {endpoint}");

    let sender = thread::spawn(move || -> vidlink::stream::Result<SessionReport> {
        let mut source = TestPattern::new(TestPatternConfig {
            width: 320,
            height: 240,
            frame_limit: Some(30),
        })?;
        Sender::connect(&endpoint, StreamConfig::default())?
            .run(&mut source, &mut JpegCodec::default())
    });

    let mut sink = LogSink::new(QuitSignal::new());
    let received = receiver
        .accept()?
        .run(&mut JpegCodec::default(), &mut sink)?;
    let sent = sender.join().map_err(|_| "sender thread panicked")??;

    eprintln!(
        "Sent {} frames ({} bytes), received {} frames, presented {}",
        sent.frames,
        sent.payload_bytes,
        received.frames,
        sink.presented()
    );
    Ok(())
}
