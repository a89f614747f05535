use std::time::Duration;

use easynet_frame::FrameConfig;

use crate::acceptor::DEFAULT_SOCKET_MODE;

/// Tunables shared by router and dealer sockets.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Frame limits applied to every connection after the greeting.
    pub frame: FrameConfig,
    /// Time allowed for the connection greeting in each direction.
    pub greeting_timeout: Duration,
    /// Protocol name exchanged in the greeting.
    pub protocol_name: String,
    /// Local protocol version (`major.minor`).
    pub protocol_version: String,
    /// Maximum greeting frame size in bytes.
    pub max_greeting_payload: usize,
    /// Bound on a single blocking send. `None` blocks until the peer drains.
    pub write_timeout: Option<Duration>,
    /// How often the router accept loop checks for new connections.
    pub accept_poll_interval: Duration,
    /// Permission mode for `ipc://` socket files.
    pub socket_mode: u32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            greeting_timeout: Duration::from_secs(5),
            protocol_name: "easynet".to_string(),
            protocol_version: "1.0".to_string(),
            max_greeting_payload: 4 * 1024,
            write_timeout: Some(Duration::from_secs(5)),
            accept_poll_interval: Duration::from_millis(25),
            socket_mode: DEFAULT_SOCKET_MODE,
        }
    }
}
