use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Host placeholder meaning "every interface" when binding.
pub const ANY_HOST: &str = "*";

/// A transport address of the form `<scheme>://<host-or-*>:<port>` or
/// `ipc://<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// TCP endpoint. `host` may be `*` when binding.
    Tcp { host: String, port: u16 },
    /// Unix domain socket path.
    Ipc(PathBuf),
}

impl Address {
    /// Parse an address string.
    pub fn parse(input: &str) -> Result<Self> {
        input.parse()
    }

    /// Scheme name (`tcp` or `ipc`).
    pub fn scheme(&self) -> &'static str {
        match self {
            Address::Tcp { .. } => "tcp",
            Address::Ipc(_) => "ipc",
        }
    }

    /// `host:port` suitable for `TcpListener::bind`; `*` becomes `0.0.0.0`.
    pub(crate) fn bind_target(&self) -> Option<String> {
        match self {
            Address::Tcp { host, port } if host == ANY_HOST => Some(format!("0.0.0.0:{port}")),
            Address::Tcp { host, port } => Some(format!("{host}:{port}")),
            Address::Ipc(_) => None,
        }
    }

    /// `host:port` suitable for `TcpStream::connect`; `*` is rejected.
    pub(crate) fn connect_target(&self) -> Result<Option<String>> {
        match self {
            Address::Tcp { host, .. } if host == ANY_HOST => Err(invalid(
                &self.to_string(),
                "wildcard host can only be bound, not connected to",
            )),
            Address::Tcp { host, port } => Ok(Some(format!("{host}:{port}"))),
            Address::Ipc(_) => Ok(None),
        }
    }
}

impl FromStr for Address {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| invalid(input, "expected <scheme>://..."))?;

        match scheme {
            "tcp" => {
                let (host, port) = rest
                    .rsplit_once(':')
                    .ok_or_else(|| invalid(input, "expected <host>:<port>"))?;
                if host.is_empty() {
                    return Err(invalid(input, "host must not be empty"));
                }
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid(input, "port must be a number in 0-65535"))?;
                Ok(Address::Tcp {
                    host: host.to_string(),
                    port,
                })
            }
            "ipc" => {
                if rest.is_empty() {
                    return Err(invalid(input, "path must not be empty"));
                }
                Ok(Address::Ipc(PathBuf::from(rest)))
            }
            other => Err(invalid(input, &format!("unsupported scheme '{other}'"))),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Address::Ipc(path) => write!(f, "ipc://{}", path.display()),
        }
    }
}

fn invalid(address: &str, reason: &str) -> TransportError {
    TransportError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wildcard_tcp() {
        let addr = Address::parse("tcp://*:7954").unwrap();
        assert_eq!(
            addr,
            Address::Tcp {
                host: "*".to_string(),
                port: 7954
            }
        );
        assert_eq!(addr.bind_target().as_deref(), Some("0.0.0.0:7954"));
        assert!(addr.connect_target().is_err());
    }

    #[test]
    fn parses_named_host_and_ipv6() {
        let addr = Address::parse("tcp://localhost:1982").unwrap();
        assert_eq!(
            addr.connect_target().unwrap().as_deref(),
            Some("localhost:1982")
        );

        let v6 = Address::parse("tcp://[::1]:9000").unwrap();
        assert_eq!(v6.to_string(), "tcp://[::1]:9000");
    }

    #[test]
    fn parses_ipc_path() {
        let addr = Address::parse("ipc:///tmp/easynet.sock").unwrap();
        assert_eq!(addr, Address::Ipc(PathBuf::from("/tmp/easynet.sock")));
        assert_eq!(addr.scheme(), "ipc");
        assert_eq!(addr.to_string(), "ipc:///tmp/easynet.sock");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for input in [
            "localhost:1982",
            "udp://host:1",
            "tcp://:1982",
            "tcp://host",
            "tcp://host:99999",
            "ipc://",
        ] {
            assert!(
                matches!(
                    Address::parse(input),
                    Err(TransportError::InvalidAddress { .. })
                ),
                "{input} should be rejected"
            );
        }
    }
}
