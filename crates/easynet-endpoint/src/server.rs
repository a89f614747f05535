use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use easynet_codec::{Codec, Received};
use easynet_frame::{parse_routed, routed};
use easynet_transport::{Address, Identity, RouterSocket, Transport};
use serde::Serialize;
use tracing::debug;

use crate::config::EndpointConfig;
use crate::endpoint::Core;
use crate::error::{EndpointError, Result};
use crate::registry::ClientRegistry;

/// Bound endpoint that talks to many clients.
///
/// Every received message carries the [`Identity`] of the client that sent
/// it; replies and pushes are addressed by identity.
pub struct Server {
    core: Core,
    clients: Arc<ClientRegistry>,
}

impl Server {
    /// Bind `address` (`tcp://host:port` or `ipc://path`) with defaults.
    pub fn bind(address: &str, codec: impl Into<Arc<Codec>>) -> Result<Self> {
        Self::bind_with_config(address, codec, EndpointConfig::default())
    }

    /// Bind `address` with explicit receive and socket settings.
    pub fn bind_with_config(
        address: &str,
        codec: impl Into<Arc<Codec>>,
        config: EndpointConfig,
    ) -> Result<Self> {
        let address = Address::parse(address)?;
        let socket = RouterSocket::bind_with_config(&address, config.socket.clone())?;
        Ok(Self::with_transport(Arc::new(socket), codec, config))
    }

    /// Build a server over any routing transport.
    ///
    /// The transport must prefix inbound frames with the sender identity and
    /// route outbound frames by their first segment.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        codec: impl Into<Arc<Codec>>,
        config: EndpointConfig,
    ) -> Self {
        let clients = Arc::new(ClientRegistry::new());
        let core = Core::new(
            "server",
            transport,
            codec.into(),
            Some(Arc::clone(&clients)),
            config,
        );
        Self { core, clients }
    }

    /// Spawn the listener thread.
    pub fn start(&self) -> Result<()> {
        self.core.start()
    }

    /// Stop the listener and release the socket. Blocks at most one receive
    /// timeout.
    pub fn stop(&self) -> Result<()> {
        self.core.stop()
    }

    /// Encode `value` and send it to `target`.
    pub fn send<T: Serialize + 'static>(&self, value: &T, target: Identity) -> Result<()> {
        let (tag, payload) = self.core.codec.encode(value)?;
        let frame = routed(target.to_segment(), tag, payload);
        if self.core.send_frame(&frame)? {
            Ok(())
        } else {
            Err(EndpointError::Unroutable(target))
        }
    }

    /// Send `value` to every known client; returns how many it reached.
    ///
    /// Clients that are no longer connected are skipped.
    pub fn broadcast<T: Serialize + 'static>(&self, value: &T) -> Result<usize> {
        let (tag, payload) = self.core.codec.encode(value)?;
        let payload = Bytes::from(payload);
        let mut delivered = 0;
        for target in self.clients.snapshot() {
            let frame = routed(target.to_segment(), tag, payload.clone());
            match self.core.send_frame(&frame) {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(EndpointError::Transport(err)) => {
                    debug!(%target, error = %err, "broadcast skipped client");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(delivered)
    }

    /// Take the oldest queued message and its sender. Never blocks.
    ///
    /// A frame that fails to decode is consumed and its error returned; later
    /// frames are unaffected.
    pub fn receive(&self) -> Result<Option<(Received, Identity)>> {
        let Some(frame) = self.core.pop() else {
            return Ok(None);
        };
        let parts = parse_routed(&frame)?;
        let identity = Identity::from_slice(parts.identity.as_deref().unwrap_or_default())?;
        let value = self.core.codec.decode_by_tag(&parts.tag, &parts.payload)?;
        Ok(Some((value, identity)))
    }

    /// Poll [`receive`](Self::receive) until a message arrives or `timeout`
    /// passes.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<(Received, Identity)>> {
        Core::poll_until(timeout, || self.receive())
    }

    /// Clients seen so far, in first-seen order.
    pub fn client_list(&self) -> Vec<Identity> {
        self.clients.snapshot()
    }

    /// Frames received but not yet taken.
    pub fn pending(&self) -> usize {
        self.core.pending()
    }

    /// True between a successful `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }

    /// Bound address, with any ephemeral port resolved.
    pub fn address(&self) -> &Address {
        self.core.address()
    }

    /// Codec shared with the listener; frozen once the server is built.
    pub fn codec(&self) -> &Codec {
        &self.core.codec
    }
}
