use tracing::info;
use vidlink_frame::FrameConfig;
use vidlink_stream::{
    Capture, ImageSource, JpegCodec, QuitSignal, Sender, SessionEnd, StreamConfig, TestPattern,
    TestPatternConfig,
};
use vidlink_transport::Endpoint;

use crate::cmd::{install_ctrlc_handler, parse_timeout, SendArgs};
use crate::exit::{
    media_error, session_torn_down, stream_error, transport_error, CliResult, SUCCESS,
};
use crate::output::{print_report, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let write_timeout = parse_timeout(args.write_timeout.as_deref())?;
    let endpoint = Endpoint::parse(&args.address, args.port)
        .map_err(|err| transport_error("invalid address", err))?;
    info!(
        mode = "send",
        address = %args.address,
        port = args.port,
        family = %endpoint.family(),
        "starting"
    );

    let pattern = TestPattern::new(TestPatternConfig {
        width: args.width,
        height: args.height,
        frame_limit: args.frames,
    })
    .map_err(|err| media_error("test pattern setup failed", err))?;
    let mut encoder = JpegCodec::new(args.quality);

    let config = StreamConfig {
        frame: FrameConfig {
            write_timeout,
            ..FrameConfig::default()
        },
        frame_interval: StreamConfig::interval_for_fps(args.fps),
        ..StreamConfig::default()
    };

    let quit = QuitSignal::new();
    install_ctrlc_handler(quit.clone())?;
    let mut source = UntilQuit {
        inner: pattern,
        quit: quit.clone(),
    };

    let sender =
        Sender::connect(&endpoint, config).map_err(|err| stream_error("connect failed", err))?;
    let mut report = match sender.run(&mut source, &mut encoder) {
        Ok(report) => report,
        Err(err) => return Ok(session_torn_down("send failed", err)),
    };
    if quit.is_requested() {
        report.end = SessionEnd::QuitRequested;
    }

    print_report(&report, format);
    Ok(SUCCESS)
}

/// Ends the source once a stop has been requested.
struct UntilQuit<S> {
    inner: S,
    quit: QuitSignal,
}

impl<S: ImageSource> ImageSource for UntilQuit<S> {
    fn capture(&mut self) -> Capture {
        if self.quit.is_requested() {
            return Capture::Exhausted;
        }
        self.inner.capture()
    }
}
