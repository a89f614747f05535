//! Router/dealer multipart sockets over TCP and Unix domain sockets.
//!
//! A [`RouterSocket`] binds an address and multiplexes any number of
//! [`DealerSocket`] peers. Each dealer announces an [`Identity`] in a short
//! greeting; the router prefixes that identity to every frame it receives and
//! routes outbound frames by their first segment.
//!
//! Both sockets implement [`Transport`], the seam endpoints are written
//! against.

mod acceptor;
pub mod address;
pub mod config;
pub mod dealer;
pub mod error;
pub mod greeting;
pub mod identity;
pub mod router;
pub mod stream;
pub mod traits;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use acceptor::DEFAULT_SOCKET_MODE;
pub use address::{Address, ANY_HOST};
pub use config::SocketConfig;
pub use dealer::DealerSocket;
pub use error::{Result, TransportError};
pub use greeting::{GreetingReply, GreetingRequest};
pub use identity::{Identity, IDENTITY_LEN};
pub use router::RouterSocket;
pub use stream::NetStream;
pub use traits::Transport;

/// Lock ignoring poison; guarded state stays consistent across panics here.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
