use std::sync::Arc;
use std::time::Duration;

use easynet_codec::{Codec, Received};
use easynet_frame::{parse_unrouted, unrouted};
use easynet_transport::{Address, DealerSocket, Identity, Transport};
use serde::Serialize;

use crate::config::EndpointConfig;
use crate::endpoint::Core;
use crate::error::Result;

/// Connected endpoint that talks to one server.
pub struct Client {
    core: Core,
    identity: Identity,
}

impl Client {
    /// Connect to `address` with a fresh random identity.
    pub fn connect(address: &str, codec: impl Into<Arc<Codec>>) -> Result<Self> {
        Self::connect_with_config(address, codec, EndpointConfig::default())
    }

    /// Connect with explicit receive and socket settings.
    pub fn connect_with_config(
        address: &str,
        codec: impl Into<Arc<Codec>>,
        config: EndpointConfig,
    ) -> Result<Self> {
        let address = Address::parse(address)?;
        let identity = Identity::random();
        let socket = DealerSocket::connect_with_config(&address, identity, config.socket.clone())?;
        Ok(Self::with_transport(Arc::new(socket), identity, codec, config))
    }

    /// Build a client over any connected transport.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        identity: Identity,
        codec: impl Into<Arc<Codec>>,
        config: EndpointConfig,
    ) -> Self {
        let core = Core::new("client", transport, codec.into(), None, config);
        Self { core, identity }
    }

    /// Spawn the listener thread so replies are queued for `receive`.
    pub fn start(&self) -> Result<()> {
        self.core.start()
    }

    /// Stop the listener and close the connection. Blocks at most one
    /// receive timeout.
    pub fn stop(&self) -> Result<()> {
        self.core.stop()
    }

    /// Encode `value` and send it to the server.
    pub fn send<T: Serialize + 'static>(&self, value: &T) -> Result<()> {
        let (tag, payload) = self.core.codec.encode(value)?;
        self.core.send_frame(&unrouted(tag, payload))?;
        Ok(())
    }

    /// Take the oldest queued message. Never blocks.
    pub fn receive(&self) -> Result<Option<Received>> {
        let Some(frame) = self.core.pop() else {
            return Ok(None);
        };
        let parts = parse_unrouted(&frame)?;
        Ok(Some(
            self.core.codec.decode_by_tag(&parts.tag, &parts.payload)?,
        ))
    }

    /// Poll [`receive`](Self::receive) until a reply arrives or `timeout`
    /// passes.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<Received>> {
        Core::poll_until(timeout, || self.receive())
    }

    /// Identity this client announces to the server. Stable for its lifetime.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Replies received but not yet taken.
    pub fn pending(&self) -> usize {
        self.core.pending()
    }

    /// True between a successful `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }

    /// Server address this client connected to.
    pub fn address(&self) -> &Address {
        self.core.address()
    }

    /// Codec used for outgoing and incoming payloads.
    pub fn codec(&self) -> &Codec {
        &self.core.codec
    }
}
