use std::time::Duration;

use easynet_transport::SocketConfig;

/// Default time the listener waits on the transport per poll.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Endpoint behavior configuration.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Per-poll transport wait. Bounds how long `stop` blocks.
    pub receive_timeout: Duration,
    /// Socket settings passed to the transport.
    pub socket: SocketConfig,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            socket: SocketConfig::default(),
        }
    }
}
