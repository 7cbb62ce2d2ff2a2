use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use vidlink_stream::{Role, SessionEnd, SessionReport};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    #[serde(flatten)]
    report: &'a SessionReport,
    finished_at: String,
}

pub fn print_report(report: &SessionReport, format: OutputFormat) {
    println!("{}", render_report(report, format));
}

fn render_report(report: &SessionReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let out = ReportOutput {
                report,
                finished_at: now_unix_seconds(),
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ROLE", "PEER", "FRAMES", "BYTES", "SKIPPED", "END"])
                .add_row(vec![
                    role_name(report.role).to_string(),
                    peer_name(report),
                    report.frames.to_string(),
                    report.payload_bytes.to_string(),
                    report.skipped.to_string(),
                    end_name(report.end).to_string(),
                ]);
            table.to_string()
        }
        OutputFormat::Pretty => format!(
            "{} peer={} frames={} bytes={} skipped={} end={}",
            role_name(report.role),
            peer_name(report),
            report.frames,
            report.payload_bytes,
            report.skipped,
            end_name(report.end)
        ),
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Sender => "sender",
        Role::Receiver => "receiver",
    }
}

fn end_name(end: SessionEnd) -> &'static str {
    match end {
        SessionEnd::PeerClosed => "peer closed",
        SessionEnd::QuitRequested => "quit requested",
        SessionEnd::FrameLimit => "frame limit",
        SessionEnd::SourceExhausted => "source exhausted",
    }
}

fn peer_name(report: &SessionReport) -> String {
    report
        .peer
        .map(|peer| peer.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
