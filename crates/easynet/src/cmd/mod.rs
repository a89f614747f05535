use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use easynet::Format;

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind a server and print the messages it receives.
    Serve(ServeArgs),
    /// Connect, send one message, and optionally wait for a reply.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Payload encoding on the wire. Both ends must agree.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum Encoding {
    #[default]
    Json,
    Msgpack,
}

impl From<Encoding> for Format {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Json => Format::Json,
            Encoding::Msgpack => Format::MessagePack,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (tcp://host:port, tcp://*:port or ipc://path).
    pub address: String,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Send every message back to its sender.
    #[arg(long)]
    pub echo: bool,
    /// Payload encoding.
    #[arg(long, value_enum, default_value = "json")]
    pub encoding: Encoding,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server address to connect to.
    pub address: String,
    /// Send a text message.
    #[arg(long, conflicts_with = "json", required_unless_present = "json")]
    pub text: Option<String>,
    /// Send a JSON value.
    #[arg(long, conflicts_with = "text")]
    pub json: Option<String>,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for a reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
    /// Payload encoding.
    #[arg(long, value_enum, default_value = "json")]
    pub encoding: Encoding,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn encoding_maps_to_format() {
        assert_eq!(Format::from(Encoding::Json), Format::Json);
        assert_eq!(Format::from(Encoding::Msgpack), Format::MessagePack);
    }
}
