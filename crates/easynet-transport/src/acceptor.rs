use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
#[cfg(unix)]
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::address::Address;
use crate::error::{Result, TransportError};
use crate::stream::NetStream;

/// Default permission mode for created socket paths.
pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

/// A bound, non-blocking listening socket.
///
/// `accept` never blocks so the accept loop can notice an unbind request.
pub(crate) struct Acceptor {
    inner: AcceptorInner,
    local: Address,
}

enum AcceptorInner {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixSocketFile),
}

impl Acceptor {
    /// Bind and listen on `address`.
    pub(crate) fn bind(address: &Address, socket_mode: u32) -> Result<Self> {
        match address {
            Address::Tcp { host, .. } => {
                let target = address
                    .bind_target()
                    .ok_or_else(|| TransportError::InvalidAddress {
                        address: address.to_string(),
                        reason: "not a tcp address".to_string(),
                    })?;
                let listener = TcpListener::bind(&target).map_err(|e| bind_error(address, e))?;
                listener
                    .set_nonblocking(true)
                    .map_err(|e| bind_error(address, e))?;
                let port = listener
                    .local_addr()
                    .map_err(|e| bind_error(address, e))?
                    .port();
                let local = Address::Tcp {
                    host: host.clone(),
                    port,
                };
                info!(address = %local, "listening on tcp socket");
                Ok(Self {
                    inner: AcceptorInner::Tcp(listener),
                    local,
                })
            }
            #[cfg(unix)]
            Address::Ipc(path) => {
                let socket = UnixSocketFile::bind(path, socket_mode)?;
                Ok(Self {
                    inner: AcceptorInner::Unix(socket),
                    local: address.clone(),
                })
            }
            #[cfg(not(unix))]
            Address::Ipc(_) => {
                let _ = socket_mode;
                Err(bind_error(
                    address,
                    std::io::Error::new(
                        ErrorKind::Unsupported,
                        "ipc:// addresses require Unix domain sockets",
                    ),
                ))
            }
        }
    }

    /// Accept a pending connection, if any.
    pub(crate) fn accept(&self) -> Result<Option<NetStream>> {
        match &self.inner {
            AcceptorInner::Tcp(listener) => match listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(false).map_err(TransportError::Accept)?;
                    debug!(%peer, "accepted tcp connection");
                    Ok(Some(NetStream::from_tcp(stream)?))
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
                Err(err) => Err(TransportError::Accept(err)),
            },
            #[cfg(unix)]
            AcceptorInner::Unix(socket) => match socket.listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).map_err(TransportError::Accept)?;
                    debug!("accepted unix connection");
                    Ok(Some(NetStream::from_unix(stream)))
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
                Err(err) => Err(TransportError::Accept(err)),
            },
        }
    }

    /// The address actually bound (TCP port 0 resolved to the real port).
    pub(crate) fn local_address(&self) -> &Address {
        &self.local
    }
}

/// Connect to a listening socket (blocking).
pub(crate) fn connect(address: &Address) -> Result<NetStream> {
    match address {
        Address::Tcp { .. } => {
            let target = address.connect_target()?.unwrap_or_default();
            let stream =
                TcpStream::connect(&target).map_err(|e| TransportError::Connect {
                    address: address.to_string(),
                    source: e,
                })?;
            debug!(%address, "connected to tcp socket");
            NetStream::from_tcp(stream)
        }
        #[cfg(unix)]
        Address::Ipc(path) => {
            let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
                address: address.to_string(),
                source: e,
            })?;
            debug!(?path, "connected to unix domain socket");
            Ok(NetStream::from_unix(stream))
        }
        #[cfg(not(unix))]
        Address::Ipc(_) => Err(TransportError::Connect {
            address: address.to_string(),
            source: std::io::Error::new(
                ErrorKind::Unsupported,
                "ipc:// addresses require Unix domain sockets",
            ),
        }),
    }
}

fn bind_error(address: &Address, source: std::io::Error) -> TransportError {
    TransportError::Bind {
        address: address.to_string(),
        source,
    }
}

/// Filesystem-path Unix domain socket, removed on drop if still ours.
#[cfg(unix)]
struct UnixSocketFile {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

#[cfg(unix)]
impl UnixSocketFile {
    fn bind(path: &Path, mode: u32) -> Result<Self> {
        let path = path.to_path_buf();
        let address = Address::Ipc(path.clone());

        let path_bytes = path.as_os_str().len();
        if path_bytes >= MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: MAX_PATH_LEN,
            });
        }

        // Remove stale socket if it exists, but never remove non-socket files.
        if path.exists() {
            let metadata =
                std::fs::symlink_metadata(&path).map_err(|e| bind_error(&address, e))?;
            if !metadata.file_type().is_socket() {
                return Err(bind_error(
                    &address,
                    std::io::Error::new(
                        ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                ));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(|e| bind_error(&address, e))?;
        }

        let listener = UnixListener::bind(&path).map_err(|e| bind_error(&address, e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| bind_error(&address, e))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| bind_error(&address, e))?;
        let created = std::fs::symlink_metadata(&path).map_err(|e| bind_error(&address, e))?;

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            path,
            created_inode: Some((created.dev(), created.ino())),
        })
    }
}

#[cfg(unix)]
impl Drop for UnixSocketFile {
    fn drop(&mut self) {
        let Some((expected_dev, expected_ino)) = self.created_inode else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(
                    path = ?self.path,
                    "socket path identity changed; skipping cleanup"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::time::{Duration, Instant};

    use super::*;

    fn accept_within(acceptor: &Acceptor, timeout: Duration) -> NetStream {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(stream) = acceptor.accept().unwrap() {
                return stream;
            }
            assert!(Instant::now() < deadline, "no connection accepted");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_tcp_bind_resolves_ephemeral_port() {
        let acceptor = Acceptor::bind(
            &Address::parse("tcp://127.0.0.1:0").unwrap(),
            DEFAULT_SOCKET_MODE,
        )
        .unwrap();
        match acceptor.local_address() {
            Address::Tcp { port, .. } => assert_ne!(*port, 0),
            other => panic!("unexpected address {other}"),
        }
        assert!(acceptor.accept().unwrap().is_none(), "accept must not block");
    }

    #[test]
    fn test_tcp_accept_connect() {
        let acceptor = Acceptor::bind(
            &Address::parse("tcp://127.0.0.1:0").unwrap(),
            DEFAULT_SOCKET_MODE,
        )
        .unwrap();
        let target = acceptor.local_address().clone();

        let handle = std::thread::spawn(move || {
            let mut client = connect(&target).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = accept_within(&acceptor, Duration::from_secs(3));
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        handle.join().unwrap();
    }

    #[test]
    fn test_tcp_bind_conflict_is_bind_error() {
        let first = Acceptor::bind(
            &Address::parse("tcp://127.0.0.1:0").unwrap(),
            DEFAULT_SOCKET_MODE,
        )
        .unwrap();
        let taken = Address::Tcp {
            host: "127.0.0.1".to_string(),
            port: match first.local_address() {
                Address::Tcp { port, .. } => *port,
                Address::Ipc(_) => unreachable!(),
            },
        };
        let result = Acceptor::bind(&taken, DEFAULT_SOCKET_MODE);
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_connect_rejects_wildcard_host() {
        let result = connect(&Address::parse("tcp://*:1").unwrap());
        assert!(matches!(result, Err(TransportError::InvalidAddress { .. })));
    }

    #[cfg(unix)]
    fn temp_sock(tag: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "easynet-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let sock = dir.join("test.sock");
        (dir, sock)
    }

    #[test]
    #[cfg(unix)]
    fn test_unix_bind_accept_connect_and_cleanup() {
        let (dir, sock_path) = temp_sock("uds");
        let address = Address::Ipc(sock_path.clone());

        let acceptor = Acceptor::bind(&address, DEFAULT_SOCKET_MODE).unwrap();
        assert!(sock_path.exists());

        let target = address.clone();
        let handle = std::thread::spawn(move || {
            let mut client = connect(&target).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = accept_within(&acceptor, Duration::from_secs(3));
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        handle.join().unwrap();

        drop(acceptor);
        assert!(
            !sock_path.exists(),
            "socket file should be cleaned up on drop"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn test_unix_path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = Acceptor::bind(
            &Address::Ipc(PathBuf::from(long_path)),
            DEFAULT_SOCKET_MODE,
        );
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_unix_default_permissions_hardened() {
        let (dir, sock_path) = temp_sock("perms");
        let acceptor =
            Acceptor::bind(&Address::Ipc(sock_path.clone()), DEFAULT_SOCKET_MODE).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(acceptor);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn test_unix_bind_rejects_existing_non_socket_file() {
        let (dir, sock_path) = temp_sock("regular");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = Acceptor::bind(&Address::Ipc(sock_path.clone()), DEFAULT_SOCKET_MODE);
        assert!(matches!(result, Err(TransportError::Bind { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn test_unix_drop_does_not_remove_replaced_path() {
        let (dir, sock_path) = temp_sock("replaced");
        let acceptor =
            Acceptor::bind(&Address::Ipc(sock_path.clone()), DEFAULT_SOCKET_MODE).unwrap();

        std::fs::remove_file(&sock_path).unwrap();
        std::fs::write(&sock_path, b"replacement-file").unwrap();

        drop(acceptor);
        assert!(
            sock_path.exists(),
            "drop must not remove path if inode identity changed"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
