use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use easynet::messages::Message;
use easynet::Identity;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    Table,
    /// `key=value` pairs on one line.
    Pretty,
    /// The payload only.
    Raw,
}

impl OutputFormat {
    /// Tables for a terminal, JSON lines when piped.
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct Record<'a> {
    tag: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<Identity>,
    payload: serde_json::Value,
    received_at_ms: u128,
}

/// Render one received message. `sender` is `None` for replies seen by a client.
pub fn render(message: &Message, sender: Option<Identity>, format: OutputFormat) -> String {
    let from = sender.map_or_else(|| "server".to_string(), |identity| identity.to_string());
    match format {
        OutputFormat::Json => {
            let record = Record {
                tag: message.tag(),
                sender,
                payload: message.to_json(),
                received_at_ms: unix_millis(),
            };
            serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FROM", "TAG", "MESSAGE"])
                .add_row(vec![from, message.tag().to_string(), message.to_string()]);
            table.to_string()
        }
        OutputFormat::Pretty => format!("from={from} tag={} message={message}", message.tag()),
        OutputFormat::Raw => message.to_string(),
    }
}

pub fn print_message(message: &Message, sender: Option<Identity>, format: OutputFormat) {
    let line = render(message, sender, format);
    let mut stdout = std::io::stdout().lock();
    // Flushed per message so piped consumers see each one as it arrives.
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis())
}
