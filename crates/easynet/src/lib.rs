//! Typed point-to-multipoint messaging.
//!
//! A server binds one address and exchanges typed messages with any number of
//! clients. Clients are told apart by an opaque identity; the server learns
//! each one the first time it hears from it.
//!
//! # Crate Structure
//!
//! - [`frame`]: multipart frames and their stream encoding
//! - [`transport`]: router/dealer sockets over TCP and Unix domain sockets
//! - [`codec`]: type-tag registry and payload formats
//! - [`endpoint`]: `Server` and `Client`
//! - [`messages`]: the text and JSON message types the `easynet` CLI speaks

pub mod messages;

/// Re-export frame types.
pub mod frame {
    pub use easynet_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use easynet_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use easynet_codec::*;
}

/// Re-export endpoint types.
pub mod endpoint {
    pub use easynet_endpoint::*;
}

pub use easynet_codec::{Codec, CodecError, Format, Received};
pub use easynet_endpoint::{Client, EndpointConfig, EndpointError, Server};
pub use easynet_transport::{Address, Identity};
