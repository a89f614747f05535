//! Message types shared by the `easynet` CLI and the bundled examples.
//!
//! Any program registering the same tags can talk to `easynet serve` and
//! `easynet send`.

use std::fmt;

use easynet_codec::{Codec, Format, Received, Result};
use serde::{Deserialize, Serialize};

/// Tag for [`Text`] messages.
pub const TEXT_TAG: &str = "easynet.text";
/// Tag for free-form JSON values.
pub const JSON_TAG: &str = "easynet.json";

/// A plain text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Codec with [`Text`] and `serde_json::Value` registered under their
/// standard tags.
pub fn standard_codec(format: Format) -> Result<Codec> {
    let mut codec = Codec::new(format);
    codec.register_as::<Text>(TEXT_TAG)?;
    codec.register_as::<serde_json::Value>(JSON_TAG)?;
    Ok(codec)
}

/// A decoded standard message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(Text),
    Json(serde_json::Value),
}

impl Message {
    /// Recover a standard message, or hand back a value of another type.
    pub fn from_received(received: Received) -> std::result::Result<Self, Received> {
        let received = match received.downcast::<Text>() {
            Ok(text) => return Ok(Message::Text(text)),
            Err(received) => received,
        };
        received.downcast::<serde_json::Value>().map(Message::Json)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Message::Text(_) => TEXT_TAG,
            Message::Json(_) => JSON_TAG,
        }
    }

    /// Payload as a JSON value: text becomes a JSON string.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Message::Text(text) => serde_json::Value::String(text.text.clone()),
            Message::Json(value) => value.clone(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(&text.text),
            Message::Json(value) => write!(f, "{value}"),
        }
    }
}
