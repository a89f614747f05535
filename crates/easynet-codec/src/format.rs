use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Payload serialization format shared by both ends of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable JSON (default, interop).
    #[default]
    Json,
    /// Compact binary MessagePack with named fields.
    #[serde(rename = "msgpack")]
    MessagePack,
}

impl Format {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::MessagePack => "msgpack",
        }
    }

    pub(crate) fn to_bytes<T: Serialize + ?Sized>(
        self,
        value: &T,
    ) -> std::result::Result<Vec<u8>, String> {
        match self {
            Format::Json => serde_json::to_vec(value).map_err(|err| err.to_string()),
            Format::MessagePack => rmp_serde::to_vec_named(value).map_err(|err| err.to_string()),
        }
    }

    pub(crate) fn from_bytes<T: DeserializeOwned>(
        self,
        bytes: &[u8],
    ) -> std::result::Result<T, String> {
        match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|err| err.to_string()),
            Format::MessagePack => rmp_serde::from_slice(bytes).map_err(|err| err.to_string()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "msgpack" | "messagepack" => Ok(Format::MessagePack),
            _ => Err(CodecError::UnknownFormat(s.to_string())),
        }
    }
}
