use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use vidlink_stream::QuitSignal;

use crate::exit::{CliError, CliResult, FAILURE};
use crate::output::OutputFormat;

pub mod receive;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a receiver and stream frames.
    Send(SendArgs),
    /// Wait for one sender and display its frames.
    Receive(ReceiveArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Receive(args) => receive::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Receiver address. Contains ':' for IPv6; `0.0.0.0` or `::` mean any.
    pub address: String,
    /// Receiver port.
    pub port: u16,
    /// Target frame rate. 0 sends as fast as possible.
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
    /// Test pattern width in pixels.
    #[arg(long, default_value_t = 640)]
    pub width: u32,
    /// Test pattern height in pixels.
    #[arg(long, default_value_t = 480)]
    pub height: u32,
    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 80)]
    pub quality: u8,
    /// Stop after N frames.
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,
    /// Give up on a stalled send after this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub write_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Address to bind. Contains ':' for IPv6; `0.0.0.0` or `::` mean any.
    pub address: String,
    /// Port to bind.
    pub port: u16,
    /// Exit after receiving N frames.
    #[arg(long, value_name = "N")]
    pub count: Option<u64>,
    /// Save every decoded frame as a JPEG in DIR.
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,
    /// Give up on a silent sender after this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub read_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub(crate) fn parse_timeout(input: Option<&str>) -> CliResult<Option<Duration>> {
    input.map(parse_duration).transpose()
}

/// First Ctrl-C stops at the next frame boundary; a second one exits now.
pub(crate) fn install_ctrlc_handler(quit: QuitSignal) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if quit.request() {
            tracing::warn!("second interrupt; exiting immediately");
            std::process::exit(FAILURE);
        }
        tracing::info!("interrupt received; stopping after current frame");
    })
    .map_err(|err| CliError::new(FAILURE, format!("signal handler setup failed: {err}")))
}
