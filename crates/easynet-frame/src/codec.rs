use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + segment count (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Per-segment header: length (4).
pub const SEGMENT_HEADER_SIZE: usize = 4;

/// Magic bytes: "EN" (0x45 0x4E).
pub const MAGIC: [u8; 2] = [0x45, 0x4E];

/// Default maximum summed segment size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Default maximum number of segments per frame.
pub const DEFAULT_MAX_SEGMENTS: usize = 64;

/// One wire message: an ordered sequence of opaque byte segments.
///
/// Empty segments are significant and preserved end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    segments: Vec<Bytes>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from segments in order.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Bytes>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a segment.
    pub fn push(&mut self, segment: impl Into<Bytes>) {
        self.segments.push(segment.into());
    }

    /// Append an empty delimiter segment.
    pub fn push_empty(&mut self) {
        self.segments.push(Bytes::new());
    }

    /// Insert a segment in front of the existing ones.
    pub fn prepend(&mut self, segment: impl Into<Bytes>) {
        self.segments.insert(0, segment.into());
    }

    /// Remove and return the first segment.
    pub fn pop_front(&mut self) -> Option<Bytes> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.segments.remove(0))
        }
    }

    /// Segment at `index`.
    pub fn get(&self, index: usize) -> Option<&Bytes> {
        self.segments.get(index)
    }

    /// All segments in order.
    pub fn segments(&self) -> &[Bytes] {
        &self.segments
    }

    /// Consume the frame and return its segments.
    pub fn into_segments(self) -> Vec<Bytes> {
        self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the frame has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of all segment lengths.
    pub fn payload_len(&self) -> usize {
        self.segments.iter().map(Bytes::len).sum()
    }

    /// The total wire size of this frame (headers + segments).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.segments.len() * SEGMENT_HEADER_SIZE + self.payload_len()
    }
}

impl<S: Into<Bytes>> FromIterator<S> for Frame {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_segments(iter)
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬────────────┬──────────────┬──────────────┬─────┐
/// │ Magic (2B) │ Count      │ Len #0       │ Segment #0   │ ... │
/// │ 0x45 0x4E  │ (2B LE)    │ (4B LE)      │ (Len bytes)  │     │
/// │ "EN"       │            │              │              │     │
/// └────────────┴────────────┴──────────────┴──────────────┴─────┘
/// ```
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    if frame.len() > u16::MAX as usize {
        return Err(FrameError::TooManySegments {
            count: frame.len(),
            max: u16::MAX as usize,
        });
    }
    if let Some(segment) = frame.segments().iter().find(|s| s.len() > u32::MAX as usize) {
        return Err(FrameError::PayloadTooLarge {
            size: segment.len(),
            max: u32::MAX as usize,
        });
    }

    dst.reserve(frame.wire_size());
    dst.put_slice(&MAGIC);
    dst.put_u16_le(frame.len() as u16);
    for segment in frame.segments() {
        dst.put_u32_le(segment.len() as u32);
        dst.put_slice(segment);
    }
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let count = u16::from_le_bytes([src[2], src[3]]) as usize;
    if count > config.max_segments {
        return Err(FrameError::TooManySegments {
            count,
            max: config.max_segments,
        });
    }

    // Walk the segment headers without consuming anything until the whole
    // frame is buffered.
    let mut lengths = Vec::with_capacity(count);
    let mut offset = HEADER_SIZE;
    let mut total = 0usize;
    for _ in 0..count {
        if src.len() < offset + SEGMENT_HEADER_SIZE {
            return Ok(None);
        }
        let len = u32::from_le_bytes([
            src[offset],
            src[offset + 1],
            src[offset + 2],
            src[offset + 3],
        ]) as usize;
        total = total.saturating_add(len);
        if total > config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: total,
                max: config.max_payload_size,
            });
        }
        lengths.push(len);
        offset += SEGMENT_HEADER_SIZE + len;
    }

    if src.len() < offset {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let segments = lengths
        .into_iter()
        .map(|len| {
            src.advance(SEGMENT_HEADER_SIZE);
            src.split_to(len).freeze()
        })
        .collect();

    Ok(Some(Frame { segments }))
}

/// Size limits for the frame codec. Timeouts belong to the stream, not the
/// codec: see `SocketConfig` in `easynet-transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum summed segment size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Maximum segments per frame. Default: 64.
    pub max_segments: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            max_segments: DEFAULT_MAX_SEGMENTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(parts: &[&'static [u8]]) -> Frame {
        parts.iter().map(|p| Bytes::from_static(p)).collect()
    }

    #[test]
    fn default_config_holds_only_size_limits() {
        assert_eq!(
            FrameConfig::default(),
            FrameConfig {
                max_payload_size: 16 * 1024 * 1024,
                max_segments: 64,
            }
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let original = frame(&[b"id", b"", b"tag", b"payload"]);

        encode_frame(&original, &mut buf).unwrap();
        assert_eq!(buf.len(), original.wire_size());

        let decoded = decode_frame(&mut buf, &FrameConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(decoded, original);
        assert!(decoded.get(1).unwrap().is_empty(), "delimiter must survive");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x45, 0x4E, 0x01][..]);
        let result = decode_frame(&mut buf, &FrameConfig::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_incomplete_segment() {
        let mut buf = BytesMut::new();
        encode_frame(&frame(&[b"hello", b"world"]), &mut buf).unwrap();
        let full = buf.len();
        buf.truncate(full - 2);

        let result = decode_frame(&mut buf, &FrameConfig::default()).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), full - 2, "partial frame must not be consumed");
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, &FrameConfig::default());
        assert!(matches!(result, Err(FrameError::InvalidMagic)));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u16_le(1);
        buf.put_u32_le(1024 * 1024 * 32);

        let result = decode_frame(&mut buf, &FrameConfig::default());
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_decode_too_many_segments() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u16_le(65);

        let result = decode_frame(&mut buf, &FrameConfig::default());
        assert!(matches!(
            result,
            Err(FrameError::TooManySegments { count: 65, max: 64 })
        ));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(&frame(&[b"first"]), &mut buf).unwrap();
        encode_frame(&frame(&[b"second", b"part"]), &mut buf).unwrap();

        let cfg = FrameConfig::default();
        let f1 = decode_frame(&mut buf, &cfg).unwrap().unwrap();
        assert_eq!(f1.segments(), &[Bytes::from_static(b"first")]);

        let f2 = decode_frame(&mut buf, &cfg).unwrap().unwrap();
        assert_eq!(f2.len(), 2);
        assert_eq!(f2.get(1).unwrap().as_ref(), b"part");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_frame() {
        let mut buf = BytesMut::new();
        encode_frame(&Frame::new(), &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);

        let decoded = decode_frame(&mut buf, &FrameConfig::default())
            .unwrap()
            .unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_prepend_and_pop_front() {
        let mut f = frame(&[b"", b"tag"]);
        f.prepend(Bytes::from_static(b"id"));
        assert_eq!(f.len(), 3);
        assert_eq!(f.pop_front().unwrap().as_ref(), b"id");
        assert_eq!(f.len(), 2);

        let mut empty = Frame::new();
        assert!(empty.pop_front().is_none());
    }

    #[test]
    fn test_frame_wire_size() {
        let f = frame(&[b"test", b""]);
        assert_eq!(f.wire_size(), HEADER_SIZE + 2 * SEGMENT_HEADER_SIZE + 4);
        assert_eq!(f.payload_len(), 4);
    }
}
