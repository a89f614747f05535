use easynet::messages::{standard_codec, Message, Text};
use easynet::{Client, Received};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{CliError, CliResult, Context, DATA_INVALID, SUCCESS, TIMEOUT};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let message = resolve_message(&args)?;

    let codec = standard_codec(args.encoding.into()).context("codec setup failed")?;
    let client = Client::connect(&args.address, codec).context("connect failed")?;
    tracing::debug!(identity = %client.identity(), "connected");

    if args.wait {
        client.start().context("start failed")?;
    }

    let sent = match &message {
        Message::Text(text) => client.send(text),
        Message::Json(value) => client.send(value),
    };
    sent.context("send failed")?;

    if args.wait {
        let reply = client
            .receive_timeout(wait_timeout)
            .context("receive failed")?
            .ok_or_else(|| {
                CliError::new(
                    TIMEOUT,
                    format!("no reply within {}", args.wait_timeout.trim()),
                )
            })?;
        print_message(&reply_message(reply)?, None, format);
        client.stop().context("stop failed")?;
    }

    Ok(SUCCESS)
}

fn resolve_message(args: &SendArgs) -> CliResult<Message> {
    if let Some(json) = &args.json {
        let value = serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::usage(format!("--json is not valid JSON: {err}")))?;
        return Ok(Message::Json(value));
    }
    match &args.text {
        Some(text) => Ok(Message::Text(Text::new(text.as_str()))),
        None => Err(CliError::usage("one of --text or --json is required")),
    }
}

fn reply_message(reply: Received) -> CliResult<Message> {
    Message::from_received(reply).map_err(|other| {
        CliError::new(
            DATA_INVALID,
            format!("reply has unexpected type tag '{}'", other.tag()),
        )
    })
}
