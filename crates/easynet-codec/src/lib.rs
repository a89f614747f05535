//! Type-tagged payload encoding for easynet messages.
//!
//! A [`Codec`] maps each registered Rust type to a UTF-8 type tag and back.
//! Senders look up the tag for the value they send; receivers resolve the tag
//! read off the wire to a decoder and get a [`Received`] they can downcast.
//!
//! Both ends must register the same types under the same tags. Unregistered
//! tags are reported, never guessed.

pub mod error;
pub mod format;
pub mod received;
pub mod registry;

pub use error::{CodecError, Result};
pub use format::Format;
pub use received::Received;
pub use registry::{Codec, MAX_TAG_LEN};
