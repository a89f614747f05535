use std::any::{Any, TypeId};
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::format::Format;
use crate::received::Received;

/// Maximum type tag length in bytes.
pub const MAX_TAG_LEN: usize = 256;

type DecodeFn = fn(Format, &[u8]) -> std::result::Result<Box<dyn Any + Send>, String>;

struct Decoder {
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
}

/// Registry of payload types keyed by type tag.
///
/// Registration happens up front; once a codec is handed to an endpoint it is
/// shared read-only behind an `Arc`.
///
/// A type may be registered under several tags. It is decoded from any of
/// them and encoded under the first.
pub struct Codec {
    format: Format,
    decoders: HashMap<String, Decoder>,
    tags: HashMap<TypeId, String>,
}

impl Codec {
    /// Create an empty codec using `format` for payload bytes.
    pub fn new(format: Format) -> Self {
        Self {
            format,
            decoders: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    /// Register `T` under its Rust type name.
    pub fn register<T>(&mut self) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.register_as::<T>(std::any::type_name::<T>())
    }

    /// Register `T` under an explicit tag.
    ///
    /// Use explicit tags when the two ends are built from different crates,
    /// since type names differ between them.
    pub fn register_as<T>(&mut self, tag: &str) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        validate_tag(tag)?;
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        if let Some(existing) = self.decoders.get(tag) {
            if existing.type_id == type_id {
                return Ok(());
            }
            return Err(CodecError::DuplicateTag {
                tag: tag.to_string(),
                existing: existing.type_name,
            });
        }

        self.decoders.insert(
            tag.to_string(),
            Decoder {
                type_id,
                type_name,
                decode: decode_as::<T>,
            },
        );
        self.tags.entry(type_id).or_insert_with(|| tag.to_string());
        debug!(tag, type_name, "registered payload type");
        Ok(())
    }

    /// Tag `T` is sent under.
    pub fn tag_for<T: 'static>(&self) -> Result<&str> {
        self.tags
            .get(&TypeId::of::<T>())
            .map(String::as_str)
            .ok_or(CodecError::Unregistered {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Serialize `value`, returning its tag and payload bytes.
    pub fn encode<T: Serialize + 'static>(&self, value: &T) -> Result<(&str, Vec<u8>)> {
        let tag = self.tag_for::<T>()?;
        let bytes = self
            .format
            .to_bytes(value)
            .map_err(|reason| CodecError::Encode {
                tag: tag.to_string(),
                reason,
            })?;
        Ok((tag, bytes))
    }

    /// Decode `bytes` with the decoder registered for `tag`.
    pub fn decode_by_tag(&self, tag: &str, bytes: &[u8]) -> Result<Received> {
        let decoder = self
            .decoders
            .get(tag)
            .ok_or_else(|| CodecError::UnknownTypeTag(tag.to_string()))?;
        let value = (decoder.decode)(self.format, bytes).map_err(|reason| CodecError::Decode {
            tag: tag.to_string(),
            reason,
        })?;
        Ok(Received::new(tag.to_string(), decoder.type_name, value))
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.decoders.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(Format::default())
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("format", &self.format)
            .field("tags", &self.tags())
            .finish()
    }
}

fn decode_as<T>(format: Format, bytes: &[u8]) -> std::result::Result<Box<dyn Any + Send>, String>
where
    T: DeserializeOwned + Send + 'static,
{
    format
        .from_bytes::<T>(bytes)
        .map(|value| Box::new(value) as Box<dyn Any + Send>)
}

fn validate_tag(tag: &str) -> Result<()> {
    let reason = if tag.is_empty() {
        "tag is empty"
    } else if tag.len() > MAX_TAG_LEN {
        "tag is too long"
    } else {
        return Ok(());
    };
    Err(CodecError::InvalidTag {
        tag: tag.to_string(),
        reason: reason.to_string(),
    })
}
