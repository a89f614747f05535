//! Multipart message frames for easynet.
//!
//! A [`Frame`] is an ordered list of opaque byte segments. On byte streams each
//! frame travels as one record:
//! - A 2-byte magic number ("EN") for stream synchronization
//! - A 2-byte little-endian segment count
//! - Per segment, a 4-byte little-endian length followed by the bytes
//!
//! The [`layout`] module builds and parses the routed / unrouted message
//! layouts that endpoints exchange on top of frames.

pub mod codec;
pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, DEFAULT_MAX_SEGMENTS,
    HEADER_SIZE, SEGMENT_HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use layout::{parse_routed, parse_unrouted, routed, unrouted, FrameParts};
pub use reader::FrameReader;
pub use writer::FrameWriter;
