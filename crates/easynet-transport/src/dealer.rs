use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use easynet_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter};
use tracing::{debug, info};

use crate::acceptor;
use crate::address::Address;
use crate::config::SocketConfig;
use crate::error::{Result, TransportError};
use crate::greeting::greet;
use crate::identity::Identity;
use crate::lock;
use crate::stream::NetStream;
use crate::traits::Transport;

/// Connected socket talking to exactly one router.
///
/// Reads and writes hold separate locks so a blocked receive never delays a
/// send.
pub struct DealerSocket {
    remote: Address,
    identity: Identity,
    reader: Mutex<FrameReader<NetStream>>,
    writer: Mutex<FrameWriter<NetStream>>,
    control: NetStream,
    closed: AtomicBool,
}

impl DealerSocket {
    /// Connect with default configuration.
    pub fn connect(address: &Address, identity: Identity) -> Result<Self> {
        Self::connect_with_config(address, identity, SocketConfig::default())
    }

    /// Connect to `address`, announcing `identity` in the greeting.
    pub fn connect_with_config(
        address: &Address,
        identity: Identity,
        config: SocketConfig,
    ) -> Result<Self> {
        let stream = acceptor::connect(address)?;
        let control = stream.try_clone()?;
        let reader_stream = stream.try_clone()?;
        reader_stream.set_read_timeout(Some(config.greeting_timeout))?;
        stream.set_write_timeout(config.write_timeout)?;

        let greeting_frame = FrameConfig {
            max_payload_size: config.max_greeting_payload,
            ..config.frame.clone()
        };
        let mut reader = FrameReader::with_config(reader_stream, greeting_frame);
        let mut writer = FrameWriter::with_config(stream, config.frame.clone());

        if let Err(err) = greet(&mut reader, &mut writer, identity, &config) {
            control.shutdown();
            return Err(err);
        }
        reader.set_max_payload_size(config.frame.max_payload_size);

        info!(%address, %identity, "connected dealer socket");
        Ok(Self {
            remote: address.clone(),
            identity,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            control,
            closed: AtomicBool::new(false),
        })
    }

    /// Identity announced to the router.
    pub fn identity(&self) -> Identity {
        self.identity
    }
}

impl Transport for DealerSocket {
    fn try_send_multipart(&self, frame: &Frame) -> Result<bool> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }
        lock(&self.writer).write_frame(frame)?;
        Ok(true)
    }

    fn try_receive_multipart(&self, timeout: Duration) -> Result<Option<Frame>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }

        let mut reader = lock(&self.reader);
        reader.get_ref().set_read_timeout(Some(timeout))?;
        match reader.read_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) if err.is_timeout() => Ok(None),
            Err(FrameError::ConnectionClosed) => {
                if self.closed.load(Ordering::SeqCst) {
                    Err(TransportError::Shutdown)
                } else {
                    Err(TransportError::Disconnected)
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    fn unbind(&self) -> Result<()> {
        // Nothing is bound on the connecting side.
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.control.shutdown();
        debug!(address = %self.remote, identity = %self.identity, "closed dealer socket");
        Ok(())
    }

    fn address(&self) -> &Address {
        &self.remote
    }

    fn transport_name(&self) -> &'static str {
        "dealer"
    }
}

impl Drop for DealerSocket {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
