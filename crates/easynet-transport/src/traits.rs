use std::time::Duration;

use easynet_frame::Frame;

use crate::address::Address;
use crate::error::Result;

/// The four primitives an endpoint needs from a socket.
///
/// Implementations must allow `try_send_multipart` and
/// `try_receive_multipart` to run concurrently from different threads.
pub trait Transport: Send + Sync {
    /// Send one multipart frame.
    ///
    /// Routing transports consume the first segment as the target identity and
    /// return `Ok(false)` when no such peer is connected.
    fn try_send_multipart(&self, frame: &Frame) -> Result<bool>;

    /// Wait up to `timeout` for one inbound frame. `Ok(None)` means no data.
    fn try_receive_multipart(&self, timeout: Duration) -> Result<Option<Frame>>;

    /// Stop accepting new peers on the bound address. Idempotent.
    fn unbind(&self) -> Result<()>;

    /// Release the socket and every peer connection. Idempotent.
    fn close(&self) -> Result<()>;

    /// Local (bound) or remote (connected) address.
    fn address(&self) -> &Address;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}
