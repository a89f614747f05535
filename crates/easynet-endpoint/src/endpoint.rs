//! Lifecycle and queue plumbing shared by [`Server`](crate::Server) and
//! [`Client`](crate::Client).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use easynet_codec::Codec;
use easynet_frame::Frame;
use easynet_transport::{Address, Transport};
use tracing::{debug, info};

use crate::config::EndpointConfig;
use crate::error::{EndpointError, Result};
use crate::listener::Listener;
use crate::queue::InboundQueue;
use crate::registry::ClientRegistry;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

enum State {
    Idle,
    Running(Listener),
    Closed,
}

pub(crate) struct Core {
    role: &'static str,
    transport: Arc<dyn Transport>,
    pub(crate) codec: Arc<Codec>,
    queue: Arc<InboundQueue>,
    clients: Option<Arc<ClientRegistry>>,
    config: EndpointConfig,
    state: Mutex<State>,
}

impl Core {
    pub(crate) fn new(
        role: &'static str,
        transport: Arc<dyn Transport>,
        codec: Arc<Codec>,
        clients: Option<Arc<ClientRegistry>>,
        config: EndpointConfig,
    ) -> Self {
        Self {
            role,
            transport,
            codec,
            queue: Arc::new(InboundQueue::new()),
            clients,
            config,
            state: Mutex::new(State::Idle),
        }
    }

    pub(crate) fn start(&self) -> Result<()> {
        let mut state = self.lock_state();
        match *state {
            State::Running(_) => return Err(EndpointError::AlreadyStarted),
            State::Closed => return Err(EndpointError::Closed),
            State::Idle => {}
        }

        let listener = Listener::spawn(
            &format!("easynet-{}-listener", self.role),
            Arc::clone(&self.transport),
            Arc::clone(&self.queue),
            self.clients.clone(),
            self.config.receive_timeout,
        )?;
        *state = State::Running(listener);
        info!(role = self.role, address = %self.transport.address(), "endpoint started");
        Ok(())
    }

    /// Mark the endpoint closed, then join the listener with the state lock
    /// released so concurrent `send_frame` calls fail fast instead of waiting.
    pub(crate) fn stop(&self) -> Result<()> {
        let mut listener = {
            let mut state = self.lock_state();
            match std::mem::replace(&mut *state, State::Closed) {
                State::Idle => {
                    *state = State::Idle;
                    return Err(EndpointError::NotStarted);
                }
                State::Closed => return Err(EndpointError::Closed),
                State::Running(listener) => listener,
            }
        };

        listener.stop();
        self.transport.unbind()?;
        self.transport.close()?;
        info!(role = self.role, address = %self.transport.address(), "endpoint stopped");
        Ok(())
    }

    pub(crate) fn is_running(&self) -> bool {
        matches!(*self.lock_state(), State::Running(_))
    }

    /// Hand a frame to the transport. `Ok(false)` means it was unroutable.
    pub(crate) fn send_frame(&self, frame: &Frame) -> Result<bool> {
        if matches!(*self.lock_state(), State::Closed) {
            return Err(EndpointError::Closed);
        }
        Ok(self.transport.try_send_multipart(frame)?)
    }

    pub(crate) fn pop(&self) -> Option<Frame> {
        self.queue.pop()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn address(&self) -> &Address {
        self.transport.address()
    }

    /// Poll `receive` until it yields or `timeout` elapses. A timeout too
    /// large to represent as an `Instant` waits without a deadline.
    pub(crate) fn poll_until<T>(
        timeout: Duration,
        mut receive: impl FnMut() -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if let Some(value) = receive()? {
                return Ok(Some(value));
            }
            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    POLL_INTERVAL.min(deadline - now)
                }
                None => POLL_INTERVAL,
            };
            thread::sleep(nap);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        let state = std::mem::replace(&mut *self.lock_state(), State::Closed);
        match state {
            State::Running(mut listener) => {
                listener.stop();
                let _ = self.transport.close();
                debug!(role = self.role, "endpoint dropped while running");
            }
            State::Idle => {
                let _ = self.transport.close();
            }
            State::Closed => {}
        }
    }
}
