//! Echo server: prints every message and sends it back to its sender.
//!
//! Run with:
//!   cargo run -p easynet --example echo-server
//!
//! In another terminal:
//!   cargo run -p easynet --features cli -- send tcp://127.0.0.1:5570 \
//!     --text 'hello' --wait --wait-timeout 3s

use std::time::Duration;

use easynet::messages::{standard_codec, Message};
use easynet::{Format, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::bind("tcp://127.0.0.1:5570", standard_codec(Format::Json)?)?;
    server.start()?;
    eprintln!("Listening on {}", server.address());

    loop {
        let Some((received, sender)) = server.receive_timeout(Duration::from_secs(1))? else {
            continue;
        };
        match Message::from_received(received) {
            Ok(Message::Text(text)) => {
                eprintln!("{sender}: {}", text.text);
                server.send(&text, sender)?;
            }
            Ok(Message::Json(value)) => {
                eprintln!("{sender}: {value}");
                server.send(&value, sender)?;
            }
            Err(other) => eprintln!("{sender}: unexpected tag {}", other.tag()),
        }
    }
}
