use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use easynet::messages::{standard_codec, Message};
use easynet::{EndpointError, Identity, Server};

use crate::cmd::ServeArgs;
use crate::exit::{CliError, CliResult, Context, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

const POLL: Duration = Duration::from_millis(200);

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let codec = standard_codec(args.encoding.into()).context("codec setup failed")?;
    let server = Server::bind(&args.address, codec).context("bind failed")?;
    server.start().context("start failed")?;
    tracing::info!(address = %server.address(), echo = args.echo, "serving");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut received = 0usize;
    while running.load(Ordering::SeqCst) && args.count.is_none_or(|limit| received < limit) {
        let next = match server.receive_timeout(POLL) {
            Err(EndpointError::Codec(err)) => {
                tracing::warn!(error = %err, "skipping undecodable message");
                continue;
            }
            other => other.context("receive failed")?,
        };
        let Some((value, sender)) = next else {
            continue;
        };

        let message = match Message::from_received(value) {
            Ok(message) => message,
            Err(other) => {
                tracing::warn!(tag = other.tag(), "skipping message of unexpected type");
                continue;
            }
        };

        received += 1;
        print_message(&message, Some(sender), format);

        if args.echo {
            echo(&server, &message, sender);
        }
    }

    server.stop().context("stop failed")?;
    tracing::info!(received, "server stopped");
    Ok(SUCCESS)
}

fn echo(server: &Server, message: &Message, sender: Identity) {
    let result = match message {
        Message::Text(text) => server.send(text, sender),
        Message::Json(value) => server.send(value, sender),
    };
    if let Err(err) = result {
        tracing::warn!(%sender, error = %err, "echo failed");
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
