//! One server, three clients: each client checks in, then the server pushes
//! a notice to every client it has seen.
//!
//! Run with:
//!   cargo run -p easynet --example broadcast

use std::time::Duration;

use easynet::messages::{standard_codec, Text};
use easynet::{Client, Format, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let codec = std::sync::Arc::new(standard_codec(Format::Json)?);
    let server = Server::bind("tcp://127.0.0.1:0", codec.clone())?;
    server.start()?;
    let address = server.address().to_string();

    let mut clients = Vec::new();
    for n in 0..3 {
        let client = Client::connect(&address, codec.clone())?;
        client.start()?;
        client.send(&Text::new(format!("client {n} checking in")))?;
        clients.push(client);
    }

    while server.client_list().len() < clients.len() {
        if let Some((received, sender)) = server.receive_timeout(Duration::from_secs(1))? {
            if let Some(text) = received.downcast_ref::<Text>() {
                println!("server <- {sender}: {}", text.text);
            }
        }
    }

    let reached = server.broadcast(&Text::new("maintenance at noon"))?;
    println!("server pushed notice to {reached} clients");

    for client in &clients {
        if let Some(received) = client.receive_timeout(Duration::from_secs(1))? {
            if let Some(text) = received.downcast_ref::<Text>() {
                println!("{} <- server: {}", client.identity(), text.text);
            }
        }
    }

    for client in &clients {
        client.stop()?;
    }
    server.stop()?;
    Ok(())
}
