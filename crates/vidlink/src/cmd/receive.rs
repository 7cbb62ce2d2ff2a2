use tracing::info;
use vidlink_frame::FrameConfig;
use vidlink_stream::{
    DisplaySink, JpegCodec, LogSink, QuitSignal, Receiver, SnapshotSink, StreamConfig,
};
use vidlink_transport::Endpoint;

use crate::cmd::{install_ctrlc_handler, parse_timeout, ReceiveArgs};
use crate::exit::{
    media_error, session_torn_down, stream_error, transport_error, CliResult, SUCCESS,
};
use crate::output::{print_report, OutputFormat};

pub fn run(args: ReceiveArgs, format: OutputFormat) -> CliResult<i32> {
    let read_timeout = parse_timeout(args.read_timeout.as_deref())?;
    let endpoint = Endpoint::parse(&args.address, args.port)
        .map_err(|err| transport_error("invalid address", err))?;
    info!(
        mode = "receive",
        address = %args.address,
        port = args.port,
        family = %endpoint.family(),
        "starting"
    );

    let quit = QuitSignal::new();
    install_ctrlc_handler(quit.clone())?;

    let config = StreamConfig {
        frame: FrameConfig {
            read_timeout,
            ..FrameConfig::default()
        },
        max_frames: args.count,
        ..StreamConfig::default()
    };

    let receiver =
        Receiver::bind(&endpoint, config).map_err(|err| stream_error("bind failed", err))?;
    let session = receiver
        .accept()
        .map_err(|err| stream_error("accept failed", err))?;

    let mut sink: Box<dyn DisplaySink> = match &args.save_dir {
        Some(dir) => Box::new(
            SnapshotSink::create(dir, quit)
                .map_err(|err| media_error("snapshot directory setup failed", err))?,
        ),
        None => Box::new(LogSink::new(quit)),
    };
    let report = match session.run(&mut JpegCodec::default(), sink.as_mut()) {
        Ok(report) => report,
        Err(err) => return Ok(session_torn_down("receive failed", err)),
    };

    print_report(&report, format);
    Ok(SUCCESS)
}
