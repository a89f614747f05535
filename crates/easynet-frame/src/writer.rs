use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// A frame is encoded into a scratch buffer and written in full. On a
/// timed-out or failed write the stream position is unknown, so callers
/// should drop the connection.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode `frame` and write all of it, then flush.
    ///
    /// Limits are checked before any byte is written, so an oversized frame
    /// leaves the stream untouched.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let limits = &self.config;
        if frame.len() > limits.max_segments {
            return Err(FrameError::TooManySegments {
                count: frame.len(),
                max: limits.max_segments,
            });
        }
        if frame.payload_len() > limits.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: frame.payload_len(),
                max: limits.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(frame, &mut self.buf)?;
        self.inner
            .write_all(&self.buf)
            .and_then(|()| self.inner.flush())
            .map_err(|err| match err.kind() {
                ErrorKind::WriteZero => FrameError::ConnectionClosed,
                _ => FrameError::Io(err),
            })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Limits enforced on every written frame.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
