//! Message layouts carried inside frames.
//!
//! Routed (server side):   `[identity][empty][type-tag][payload]`
//! Unrouted (client side): `[empty][type-tag][payload]`
//!
//! The empty delimiter belongs to the router addressing scheme and is kept
//! even though it carries no data. Unrouted parsing also accepts the
//! delimiter-less `[type-tag][payload]` form.

use bytes::Bytes;

use crate::codec::Frame;
use crate::error::{FrameError, Result};

/// The addressed pieces of an application message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameParts {
    /// Routing identity, present only for routed frames.
    pub identity: Option<Bytes>,
    /// Type tag naming the payload shape.
    pub tag: String,
    /// Encoded payload.
    pub payload: Bytes,
}

/// Build a routed frame: `[identity][empty][tag][payload]`.
pub fn routed(identity: impl Into<Bytes>, tag: &str, payload: impl Into<Bytes>) -> Frame {
    let mut frame = unrouted(tag, payload);
    frame.prepend(identity);
    frame
}

/// Build an unrouted frame: `[empty][tag][payload]`.
pub fn unrouted(tag: &str, payload: impl Into<Bytes>) -> Frame {
    let mut frame = Frame::new();
    frame.push_empty();
    frame.push(Bytes::copy_from_slice(tag.as_bytes()));
    frame.push(payload);
    frame
}

/// Split a routed frame into identity, tag and payload.
pub fn parse_routed(frame: &Frame) -> Result<FrameParts> {
    let [identity, delimiter, tag, payload] = frame.segments() else {
        return Err(FrameError::Layout(format!(
            "routed frame needs 4 segments, got {}",
            frame.len()
        )));
    };
    if identity.is_empty() {
        return Err(FrameError::Layout("identity segment is empty".to_string()));
    }
    if !delimiter.is_empty() {
        return Err(FrameError::Layout(
            "delimiter segment is not empty".to_string(),
        ));
    }

    Ok(FrameParts {
        identity: Some(identity.clone()),
        tag: tag_from(tag)?,
        payload: payload.clone(),
    })
}

/// Split an unrouted frame into tag and payload.
pub fn parse_unrouted(frame: &Frame) -> Result<FrameParts> {
    let (tag, payload) = match frame.segments() {
        [delimiter, tag, payload] if delimiter.is_empty() => (tag, payload),
        [tag, payload] => (tag, payload),
        segments => {
            return Err(FrameError::Layout(format!(
                "unrouted frame needs [empty][tag][payload] or [tag][payload], got {} segments",
                segments.len()
            )))
        }
    };

    Ok(FrameParts {
        identity: None,
        tag: tag_from(tag)?,
        payload: payload.clone(),
    })
}

fn tag_from(segment: &Bytes) -> Result<String> {
    if segment.is_empty() {
        return Err(FrameError::Layout("type tag segment is empty".to_string()));
    }
    std::str::from_utf8(segment)
        .map(str::to_string)
        .map_err(|_| FrameError::Layout("type tag is not valid UTF-8".to_string()))
}
