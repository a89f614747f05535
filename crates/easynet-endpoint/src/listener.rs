//! Background thread that drains the transport into the inbound queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use easynet_frame::Frame;
use easynet_transport::{Identity, Transport, TransportError};
use tracing::{debug, info, warn};

use crate::error::{EndpointError, Result};
use crate::queue::InboundQueue;
use crate::registry::ClientRegistry;

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a running listener thread.
pub(crate) struct Listener {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

struct Worker {
    transport: Arc<dyn Transport>,
    queue: Arc<InboundQueue>,
    clients: Option<Arc<ClientRegistry>>,
    stop: Arc<AtomicBool>,
    receive_timeout: Duration,
}

impl Listener {
    /// Spawn the listener. With `clients` set, frames are treated as routed
    /// and their sender identity is recorded before queueing.
    pub(crate) fn spawn(
        name: &str,
        transport: Arc<dyn Transport>,
        queue: Arc<InboundQueue>,
        clients: Option<Arc<ClientRegistry>>,
        receive_timeout: Duration,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            transport,
            queue,
            clients,
            stop: Arc::clone(&stop),
            receive_timeout,
        };
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker.run())
            .map_err(EndpointError::Spawn)?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to exit.
    pub(crate) fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("listener thread panicked");
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Worker {
    fn run(self) {
        debug!(
            address = %self.transport.address(),
            transport = self.transport.transport_name(),
            "listener started"
        );
        let mut failing = false;

        while !self.stopped() {
            match self.transport.try_receive_multipart(self.receive_timeout) {
                Ok(Some(frame)) => {
                    failing = false;
                    self.accept(frame);
                }
                Ok(None) => {}
                Err(TransportError::Shutdown) => {
                    debug!("transport shut down under listener");
                    break;
                }
                Err(err) => {
                    if failing {
                        debug!(error = %err, "receive still failing");
                    } else {
                        warn!(error = %err, "receive failed; backing off");
                    }
                    failing = true;
                    self.back_off();
                }
            }
        }

        debug!(address = %self.transport.address(), "listener stopped");
    }

    fn accept(&self, frame: Frame) {
        if let Some(clients) = &self.clients {
            let identity = frame.get(0).map(|segment| Identity::from_slice(segment));
            match identity {
                Some(Ok(identity)) => {
                    if clients.record(identity) {
                        info!(%identity, "new client");
                    }
                }
                _ => {
                    warn!(segments = frame.len(), "dropping frame without a valid identity");
                    return;
                }
            }
        }
        self.queue.push(frame);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Sleep one receive interval, waking early on stop.
    fn back_off(&self) {
        let until = Instant::now().checked_add(self.receive_timeout);
        while !self.stopped() {
            let nap = match until {
                Some(until) => {
                    let now = Instant::now();
                    if now >= until {
                        break;
                    }
                    STOP_CHECK_INTERVAL.min(until - now)
                }
                None => STOP_CHECK_INTERVAL,
            };
            thread::sleep(nap);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use easynet_transport::Address;

    use super::*;

    /// Scripted transport: replays queued results, then reports no data.
    struct ScriptedTransport {
        address: Address,
        script: Mutex<Vec<easynet_transport::Result<Option<Frame>>>>,
        polls: Mutex<usize>,
    }

    impl ScriptedTransport {
        fn new(mut script: Vec<easynet_transport::Result<Option<Frame>>>) -> Arc<Self> {
            script.reverse();
            Arc::new(Self {
                address: Address::parse("tcp://127.0.0.1:1").expect("address should parse"),
                script: Mutex::new(script),
                polls: Mutex::new(0),
            })
        }
    }

    impl Transport for ScriptedTransport {
        fn try_send_multipart(&self, _frame: &Frame) -> easynet_transport::Result<bool> {
            Ok(true)
        }

        fn try_receive_multipart(
            &self,
            timeout: Duration,
        ) -> easynet_transport::Result<Option<Frame>> {
            *self.polls.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop();
            match next {
                Some(result) => result,
                None => {
                    thread::sleep(timeout);
                    Ok(None)
                }
            }
        }

        fn unbind(&self) -> easynet_transport::Result<()> {
            Ok(())
        }

        fn close(&self) -> easynet_transport::Result<()> {
            Ok(())
        }

        fn address(&self) -> &Address {
            &self.address
        }

        fn transport_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn routed(identity: Identity, payload: &'static [u8]) -> Frame {
        Frame::from_segments([
            identity.to_segment(),
            Bytes::new(),
            Bytes::from_static(b"tag"),
            Bytes::from_static(payload),
        ])
    }

    fn wait_for(queue: &InboundQueue, len: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while queue.len() < len {
            assert!(Instant::now() < deadline, "queue never reached {len}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn records_sender_and_queues_frame() {
        let identity = Identity::random();
        let transport = ScriptedTransport::new(vec![
            Ok(Some(routed(identity, b"one"))),
            Ok(Some(routed(identity, b"two"))),
        ]);
        let queue = Arc::new(InboundQueue::new());
        let clients = Arc::new(ClientRegistry::new());

        let mut listener = Listener::spawn(
            "test-listener",
            transport,
            Arc::clone(&queue),
            Some(Arc::clone(&clients)),
            Duration::from_millis(20),
        )
        .expect("listener should spawn");

        wait_for(&queue, 2);
        listener.stop();
        assert_eq!(clients.snapshot(), vec![identity]);
    }

    #[test]
    fn drops_frames_with_bad_identity() {
        let good = Identity::random();
        let bad = Frame::from_segments([
            Bytes::from_static(b"short"),
            Bytes::new(),
            Bytes::from_static(b"tag"),
            Bytes::from_static(b"x"),
        ]);
        let transport = ScriptedTransport::new(vec![
            Ok(Some(bad)),
            Ok(Some(Frame::new())),
            Ok(Some(routed(good, b"ok"))),
        ]);
        let queue = Arc::new(InboundQueue::new());
        let clients = Arc::new(ClientRegistry::new());

        let mut listener = Listener::spawn(
            "test-listener",
            transport,
            Arc::clone(&queue),
            Some(Arc::clone(&clients)),
            Duration::from_millis(20),
        )
        .expect("listener should spawn");

        wait_for(&queue, 1);
        listener.stop();
        assert_eq!(queue.len(), 1);
        assert_eq!(clients.len(), 1);
    }

    #[test]
    fn survives_transport_errors() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Disconnected),
            Err(TransportError::Disconnected),
            Ok(Some(Frame::from_segments([&b""[..], &b"tag"[..], &b"x"[..]]))),
        ]);
        let queue = Arc::new(InboundQueue::new());

        let mut listener = Listener::spawn(
            "test-listener",
            transport,
            Arc::clone(&queue),
            None,
            Duration::from_millis(10),
        )
        .expect("listener should spawn");

        wait_for(&queue, 1);
        listener.stop();
    }

    #[test]
    fn stop_returns_within_one_receive_timeout() {
        let transport = ScriptedTransport::new(Vec::new());
        let mut listener = Listener::spawn(
            "test-listener",
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(InboundQueue::new()),
            None,
            Duration::from_millis(100),
        )
        .expect("listener should spawn");

        thread::sleep(Duration::from_millis(30));
        let started = Instant::now();
        listener.stop();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(*transport.polls.lock().unwrap() >= 1);
    }

    #[test]
    fn unbounded_back_off_still_honours_stop() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Disconnected)]);
        let mut listener = Listener::spawn(
            "test-listener",
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(InboundQueue::new()),
            None,
            Duration::MAX,
        )
        .expect("listener should spawn");

        let deadline = Instant::now() + Duration::from_secs(2);
        while *transport.polls.lock().unwrap() == 0 {
            assert!(Instant::now() < deadline, "listener never polled");
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(30));

        let started = Instant::now();
        listener.stop();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(*transport.polls.lock().unwrap(), 1);
    }
}
