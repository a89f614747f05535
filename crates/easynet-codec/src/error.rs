/// Errors that can occur while registering, encoding or decoding payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The type being sent was never registered.
    #[error("type {type_name} is not registered")]
    Unregistered { type_name: &'static str },

    /// A received tag has no registered decoder.
    #[error("unknown type tag '{0}'")]
    UnknownTypeTag(String),

    /// The tag already belongs to a different type.
    #[error("tag '{tag}' is already registered to {existing}")]
    DuplicateTag { tag: String, existing: &'static str },

    /// The tag is empty or too long.
    #[error("invalid type tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },

    /// The value could not be serialized.
    #[error("failed to encode '{tag}': {reason}")]
    Encode { tag: String, reason: String },

    /// The payload bytes do not decode to the registered type.
    #[error("failed to decode '{tag}': {reason}")]
    Decode { tag: String, reason: String },

    /// The format name is not recognised.
    #[error("unknown payload format '{0}' (expected json or msgpack)")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
