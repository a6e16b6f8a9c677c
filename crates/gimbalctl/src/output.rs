use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gimbalctl_frame::command::{address_name, identifier_name};
use gimbalctl_frame::{Frame, Marker};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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

/// Result of one command against a device.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub command: &'static str,
    pub target: SocketAddr,
    /// Short result word or value: `sent`, `acknowledged`, `confirmed`,
    /// a recording status, a firmware version.
    pub result: String,
    /// The encoded command, when a single frame was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    /// The raw reply, when one was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    pub timestamp: String,
}

impl Outcome {
    pub fn new(command: &'static str, target: SocketAddr, result: impl Into<String>) -> Self {
        Self {
            command,
            target,
            result: result.into(),
            frame: None,
            reply: None,
            timestamp: now_unix_seconds(),
        }
    }

    pub fn with_frame(mut self, frame: &Frame) -> Self {
        self.frame = Some(frame.as_str().to_string());
        self
    }

    pub fn with_reply(mut self, reply: &[u8]) -> Self {
        self.reply = Some(String::from_utf8_lossy(reply).into_owned());
        self
    }
}

pub fn print_outcome(outcome: &Outcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(outcome),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "TARGET", "RESULT", "FRAME", "REPLY"])
                .add_row(vec![
                    outcome.command.to_string(),
                    outcome.target.to_string(),
                    outcome.result.clone(),
                    outcome.frame.clone().unwrap_or_default(),
                    outcome.reply.clone().unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = format!(
                "{} target={} result={}",
                outcome.command, outcome.target, outcome.result
            );
            if let Some(frame) = &outcome.frame {
                line.push_str(&format!(" frame={frame}"));
            }
            if let Some(reply) = &outcome.reply {
                line.push_str(&format!(" reply={reply}"));
            }
            println!("{line}");
        }
        OutputFormat::Raw => match &outcome.reply {
            Some(reply) => print_raw(reply.as_bytes()),
            None => println!("{}", outcome.result),
        },
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    frame: &'a str,
    marker: &'static str,
    source: String,
    source_name: &'static str,
    dest: String,
    dest_name: &'static str,
    control: String,
    identifier: String,
    identifier_name: &'static str,
    wire_size: usize,
}

impl<'a> FrameOutput<'a> {
    fn describe(frame: &'a Frame) -> Self {
        let marker = match frame.marker() {
            Marker::Current => "#TP",
            Marker::Legacy => "#tp",
        };
        Self {
            frame: frame.as_str(),
            marker,
            source: frame.source().to_string(),
            source_name: address_name(frame.source()),
            dest: frame.dest().to_string(),
            dest_name: address_name(frame.dest()),
            control: frame.control().to_string(),
            identifier: frame.identifier().to_string(),
            identifier_name: identifier_name(frame.identifier()),
            wire_size: frame.wire_size(),
        }
    }
}

/// Print an encoded frame without sending it.
pub fn print_frame(frame: &Frame, format: OutputFormat) {
    let out = FrameOutput::describe(frame);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "SOURCE", "DEST", "CONTROL", "ID", "SIZE"])
                .add_row(vec![
                    out.frame.to_string(),
                    format!("{} ({})", out.source, out.source_name),
                    format!("{} ({})", out.dest, out.dest_name),
                    out.control.clone(),
                    format!("{} ({})", out.identifier, out.identifier_name),
                    out.wire_size.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} {}->{} control={} id={} ({}) size={}",
                out.frame,
                out.source,
                out.dest,
                out.control,
                out.identifier,
                out.identifier_name,
                out.wire_size
            );
        }
        OutputFormat::Raw => print_raw(frame.as_bytes()),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
