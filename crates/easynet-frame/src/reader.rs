use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// A read timeout surfaces as [`FrameError::Io`] (see [`FrameError::is_timeout`])
/// and keeps already-buffered bytes, so the next call resumes the same frame.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame, blocking until one is buffered.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` on EOF, including EOF in
    /// the middle of a frame.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, &self.config)? {
                return Ok(frame);
            }
            if self.fill()? == 0 {
                return Err(FrameError::ConnectionClosed);
            }
        }
    }

    /// Append the bytes of one successful `read` to the buffer.
    fn fill(&mut self) -> Result<usize> {
        let start = self.buf.len();
        self.buf.resize(start + READ_CHUNK_SIZE, 0);
        let read = loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Io(err));
                }
            }
        };
        self.buf.truncate(start + read);
        Ok(read)
    }

    /// Number of bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// The underlying stream, e.g. to adjust its read timeout.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream. Buffered bytes are
    /// discarded.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Raise or lower the payload cap, e.g. after a greeting.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Limits applied while decoding.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, Bytes, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, MAGIC};

    fn wire_of(frames: &[Frame]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for frame in frames {
            encode_frame(frame, &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let sent = Frame::from_segments([&b"tag"[..], &b"hello"[..]]);
        let mut reader = FrameReader::new(Cursor::new(wire_of(&[sent.clone()])));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame, sent);
    }

    #[test]
    fn read_multiple_frames() {
        let frames = vec![
            Frame::from_segments([&b"one"[..]]),
            Frame::from_segments([&b""[..], &b"two"[..]]),
            Frame::from_segments([&b"three"[..], &b""[..], &b"x"[..]]),
        ];
        let mut reader = FrameReader::new(Cursor::new(wire_of(&frames)));

        for expected in &frames {
            assert_eq!(&reader.read_frame().unwrap(), expected);
        }
    }

    #[test]
    fn read_frame_with_large_segment() {
        let payload = vec![0xAB; 64 * 1024];
        let sent = Frame::from_segments([Bytes::from(payload.clone())]);
        let mut reader = FrameReader::new(Cursor::new(wire_of(&[sent])));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.get(0).unwrap().as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let sent = Frame::from_segments([&b"id"[..], &b""[..], &b"slow"[..]]);
        let byte_reader = ByteByByteReader {
            bytes: wire_of(&[sent.clone()]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        assert_eq!(reader.read_frame().unwrap(), sent);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_slice(&MAGIC);
        partial.put_u16_le(1);
        partial.put_u32_le(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn invalid_magic_in_stream() {
        let bytes = vec![0x00, 0x01, 0x00, 0x00];
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidMagic));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_slice(&MAGIC);
        wire.put_u16_le(1);
        wire.put_u32_le(1024);

        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let sent = Frame::from_segments([&b""[..], &b"ping"[..]]);
        writer.write_frame(&sent).unwrap();

        assert_eq!(reader.read_frame().unwrap(), sent);
    }

    #[test]
    #[cfg(unix)]
    fn timeout_keeps_partial_frame_buffered() {
        let (mut left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        right
            .set_read_timeout(Some(std::time::Duration::from_millis(20)))
            .unwrap();
        let mut reader = FrameReader::new(right);

        let sent = Frame::from_segments([&b"tag"[..], &b"resumed"[..]]);
        let wire = wire_of(&[sent.clone()]);
        let split = wire.len() / 2;

        std::io::Write::write_all(&mut left, &wire[..split]).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
        assert_eq!(reader.buffered(), split);

        std::io::Write::write_all(&mut left, &wire[split..]).unwrap();
        assert_eq!(reader.read_frame().unwrap(), sent);
    }

    #[test]
    fn would_block_surfaces_then_resumes() {
        let reader = WouldBlockThenData {
            state: 0,
            bytes: wire_of(&[Frame::from_segments([&b"ok"[..]])]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let err = framed.read_frame().unwrap_err();
        assert!(err.is_timeout());

        let frame = framed.read_frame().unwrap();
        assert_eq!(frame, Frame::from_segments([&b"ok"[..]]));
    }

    struct WouldBlockThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
