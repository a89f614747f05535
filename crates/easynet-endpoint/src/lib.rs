//! Typed point-to-multipoint messaging endpoints.
//!
//! A [`Server`] binds an address and exchanges typed messages with any number
//! of [`Client`]s. Each endpoint runs one listener thread that drains the
//! transport into an in-memory queue; `receive()` pops from that queue and
//! never blocks.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use easynet_codec::{Codec, Format};
//! use easynet_endpoint::{Client, Server};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Ping {
//!     seq: u32,
//! }
//!
//! let mut codec = Codec::new(Format::Json);
//! codec.register_as::<Ping>("demo.ping")?;
//! let codec = std::sync::Arc::new(codec);
//!
//! let server = Server::bind("tcp://127.0.0.1:0", codec.clone())?;
//! server.start()?;
//!
//! let client = Client::connect(&server.address().to_string(), codec)?;
//! client.start()?;
//! client.send(&Ping { seq: 1 })?;
//!
//! if let Some((message, from)) = server.receive_timeout(Duration::from_secs(1))? {
//!     assert!(message.is::<Ping>());
//!     server.send(&Ping { seq: 2 }, from)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

/// Client endpoint.
pub mod client;
/// Endpoint configuration.
pub mod config;
mod endpoint;
/// Endpoint errors.
pub mod error;
mod listener;
/// Inbound frame queue.
pub mod queue;
/// Server-side record of client identities.
pub mod registry;
/// Server endpoint.
pub mod server;

pub use client::Client;
pub use config::{EndpointConfig, DEFAULT_RECEIVE_TIMEOUT};
pub use error::{EndpointError, Result};
pub use queue::InboundQueue;
pub use registry::ClientRegistry;
pub use server::Server;
