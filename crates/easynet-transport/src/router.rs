use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use easynet_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter};
use tracing::{debug, info, warn};

use crate::acceptor::Acceptor;
use crate::address::Address;
use crate::config::SocketConfig;
use crate::error::{Result, TransportError};
use crate::greeting::accept_greeting;
use crate::identity::Identity;
use crate::lock;
use crate::stream::NetStream;
use crate::traits::Transport;

/// Bound socket that multiplexes many dealer peers.
///
/// Every inbound frame is prefixed with the identity of the connection it
/// arrived on; every outbound frame is routed by its first segment, which is
/// stripped before writing.
pub struct RouterSocket {
    local: Address,
    shared: Arc<RouterShared>,
    inbound: Receiver<Frame>,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
}

struct RouterShared {
    config: SocketConfig,
    peers: Mutex<HashMap<Identity, Arc<PeerConnection>>>,
    accepting: AtomicBool,
    closed: AtomicBool,
    inbound: Sender<Frame>,
}

struct PeerConnection {
    writer: Mutex<FrameWriter<NetStream>>,
    control: NetStream,
}

impl RouterSocket {
    /// Bind with default configuration.
    pub fn bind(address: &Address) -> Result<Self> {
        Self::bind_with_config(address, SocketConfig::default())
    }

    /// Bind and start accepting peers.
    pub fn bind_with_config(address: &Address, config: SocketConfig) -> Result<Self> {
        let acceptor = Acceptor::bind(address, config.socket_mode)?;
        let local = acceptor.local_address().clone();
        let (tx, rx) = channel::unbounded();

        let shared = Arc::new(RouterShared {
            config,
            peers: Mutex::new(HashMap::new()),
            accepting: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            inbound: tx,
        });

        let accept_thread = thread::Builder::new()
            .name("easynet-accept".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || accept_loop(acceptor, shared)
            })?;

        Ok(Self {
            local,
            shared,
            inbound: rx,
            accept_thread: Mutex::new(Some(accept_thread)),
        })
    }

    /// Identities of currently connected peers (unordered).
    pub fn connected_peers(&self) -> Vec<Identity> {
        lock(&self.shared.peers).keys().copied().collect()
    }
}

impl Transport for RouterSocket {
    fn try_send_multipart(&self, frame: &Frame) -> Result<bool> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }

        let Some(first) = frame.get(0) else {
            return Err(TransportError::Frame(FrameError::Layout(
                "routed frame has no identity segment".to_string(),
            )));
        };
        let identity = match Identity::from_slice(first) {
            Ok(identity) => identity,
            Err(err) => {
                debug!(error = %err, "dropping frame with malformed routing identity");
                return Ok(false);
            }
        };

        let connection = lock(&self.shared.peers).get(&identity).cloned();
        let Some(connection) = connection else {
            debug!(%identity, "dropping frame for unknown peer");
            return Ok(false);
        };

        let body: Frame = frame.segments()[1..].iter().cloned().collect();
        let result = lock(&connection.writer).write_frame(&body);
        match result {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(%identity, error = %err, "send failed; dropping peer");
                self.shared.forget(identity, &connection);
                connection.control.shutdown();
                Err(err.into())
            }
        }
    }

    fn try_receive_multipart(&self, timeout: Duration) -> Result<Option<Frame>> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }
        match self.inbound.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Shutdown),
        }
    }

    fn unbind(&self) -> Result<()> {
        self.shared.accepting.store(false, Ordering::SeqCst);
        if let Some(handle) = lock(&self.accept_thread).take() {
            if handle.join().is_err() {
                warn!(address = %self.local, "accept thread panicked");
            }
            info!(address = %self.local, "unbound router socket");
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.unbind()?;
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let peers: Vec<Arc<PeerConnection>> = lock(&self.shared.peers)
            .drain()
            .map(|(_, connection)| connection)
            .collect();
        for connection in &peers {
            connection.control.shutdown();
        }
        info!(address = %self.local, peers = peers.len(), "closed router socket");
        Ok(())
    }

    fn address(&self) -> &Address {
        &self.local
    }

    fn transport_name(&self) -> &'static str {
        "router"
    }
}

impl Drop for RouterSocket {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl RouterShared {
    /// Remove `identity` only if it still maps to `connection`.
    fn forget(&self, identity: Identity, connection: &Arc<PeerConnection>) {
        let mut peers = lock(&self.peers);
        if let Some(current) = peers.get(&identity) {
            if Arc::ptr_eq(current, connection) {
                peers.remove(&identity);
            }
        }
    }
}

fn accept_loop(acceptor: Acceptor, shared: Arc<RouterShared>) {
    let poll = shared.config.accept_poll_interval;
    while shared.accepting.load(Ordering::SeqCst) {
        match acceptor.accept() {
            Ok(Some(stream)) => {
                let spawned = thread::Builder::new()
                    .name("easynet-peer".to_string())
                    .spawn({
                        let shared = Arc::clone(&shared);
                        move || serve_connection(shared, stream)
                    });
                if let Err(err) = spawned {
                    warn!(error = %err, "failed to spawn peer thread");
                }
            }
            Ok(None) => thread::sleep(poll),
            Err(err) => {
                warn!(error = %err, "accept failed");
                thread::sleep(poll);
            }
        }
    }
    debug!(address = %acceptor.local_address(), "accept loop stopped");
}

fn serve_connection(shared: Arc<RouterShared>, stream: NetStream) {
    let label = stream.peer_label();
    let (identity, connection, mut reader) = match admit_peer(&shared, stream) {
        Ok(admitted) => admitted,
        Err(err) => {
            warn!(peer = %label, error = %err, "rejected connection");
            return;
        }
    };
    info!(%identity, peer = %label, "peer connected");

    loop {
        match reader.read_frame() {
            Ok(mut frame) => {
                frame.prepend(identity.to_segment());
                if shared.inbound.send(frame).is_err() {
                    break;
                }
            }
            Err(FrameError::ConnectionClosed) => {
                debug!(%identity, "peer disconnected");
                break;
            }
            Err(err) => {
                if !shared.closed.load(Ordering::SeqCst) {
                    warn!(%identity, error = %err, "peer read failed");
                }
                break;
            }
        }
    }

    shared.forget(identity, &connection);
    connection.control.shutdown();
}

fn admit_peer(
    shared: &RouterShared,
    stream: NetStream,
) -> Result<(Identity, Arc<PeerConnection>, FrameReader<NetStream>)> {
    let config = &shared.config;
    let control = stream.try_clone()?;
    let reader_stream = stream.try_clone()?;
    reader_stream.set_read_timeout(Some(config.greeting_timeout))?;
    stream.set_write_timeout(config.write_timeout)?;

    // Greeting uses a tighter pre-identity payload budget.
    let greeting_frame = FrameConfig {
        max_payload_size: config.max_greeting_payload,
        ..config.frame.clone()
    };
    let mut reader = FrameReader::with_config(reader_stream, greeting_frame);
    let mut writer = FrameWriter::with_config(stream, config.frame.clone());

    let identity = accept_greeting(&mut reader, &mut writer, config, |identity| {
        if lock(&shared.peers).contains_key(identity) {
            return Err(TransportError::Handshake(format!(
                "identity {identity} is already connected"
            )));
        }
        Ok(())
    })?;

    reader.set_max_payload_size(config.frame.max_payload_size);
    reader.get_ref().set_read_timeout(None)?;

    let connection = Arc::new(PeerConnection {
        writer: Mutex::new(writer),
        control,
    });

    if shared.closed.load(Ordering::SeqCst) {
        connection.control.shutdown();
        return Err(TransportError::Shutdown);
    }
    match lock(&shared.peers).entry(identity) {
        Entry::Occupied(_) => {
            connection.control.shutdown();
            Err(TransportError::Handshake(format!(
                "identity {identity} is already connected"
            )))
        }
        Entry::Vacant(slot) => {
            slot.insert(Arc::clone(&connection));
            Ok((identity, connection, reader))
        }
    }
}
