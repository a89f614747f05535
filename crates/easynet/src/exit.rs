use std::fmt;
use std::io;

use easynet::frame::FrameError;
use easynet::transport::TransportError;
use easynet::{CodecError, EndpointError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

/// Error surfaced to the user: printed on stderr, `code` becomes the exit status.
#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Exit status a library error maps to.
pub trait ExitCode {
    fn exit_code(&self) -> i32;
}

impl ExitCode for io::Error {
    fn exit_code(&self) -> i32 {
        match self.kind() {
            io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::NotFound
            | io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
            _ => INTERNAL,
        }
    }
}

impl ExitCode for FrameError {
    fn exit_code(&self) -> i32 {
        match self {
            FrameError::Io(source) => source.exit_code(),
            FrameError::ConnectionClosed => TRANSPORT_ERROR,
            _ => DATA_INVALID,
        }
    }
}

impl ExitCode for TransportError {
    fn exit_code(&self) -> i32 {
        match self {
            TransportError::Bind { source, .. }
            | TransportError::Connect { source, .. }
            | TransportError::Accept(source)
            | TransportError::Io(source) => source.exit_code(),
            TransportError::Frame(err) => err.exit_code(),
            TransportError::InvalidAddress { .. } | TransportError::PathTooLong { .. } => USAGE,
            _ => TRANSPORT_ERROR,
        }
    }
}

impl ExitCode for CodecError {
    fn exit_code(&self) -> i32 {
        DATA_INVALID
    }
}

impl ExitCode for EndpointError {
    fn exit_code(&self) -> i32 {
        match self {
            EndpointError::Transport(err) => err.exit_code(),
            EndpointError::Frame(err) => err.exit_code(),
            EndpointError::Codec(err) => err.exit_code(),
            EndpointError::Unroutable(_) => FAILURE,
            _ => INTERNAL,
        }
    }
}

/// Attach a short description of the failed step, keeping the mapped code.
pub trait Context<T> {
    fn context(self, what: &str) -> CliResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: ExitCode + fmt::Display,
{
    fn context(self, what: &str) -> CliResult<T> {
        self.map_err(|err| CliError::new(err.exit_code(), format!("{what}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed<E: ExitCode + fmt::Display>(err: E, what: &str) -> CliError {
        match Err::<(), E>(err).context(what) {
            Err(err) => err,
            Ok(()) => unreachable!(),
        }
    }

    #[test]
    fn bind_conflict_maps_to_transport_code() {
        let err = EndpointError::Transport(TransportError::Bind {
            address: "tcp://127.0.0.1:1".to_string(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        });
        assert_eq!(failed(err, "bind failed").code, TRANSPORT_ERROR);
    }

    #[test]
    fn bad_address_is_usage() {
        let err = EndpointError::Transport(TransportError::InvalidAddress {
            address: "udp://x".to_string(),
            reason: "unsupported scheme".to_string(),
        });
        assert_eq!(failed(err, "bind failed").code, USAGE);
    }

    #[test]
    fn codec_errors_are_data_invalid() {
        let err = EndpointError::Codec(CodecError::UnknownTypeTag("x".to_string()));
        let mapped = failed(err, "receive failed");
        assert_eq!(mapped.code, DATA_INVALID);
        assert!(mapped.message.starts_with("receive failed: "));
    }

    #[test]
    fn permission_denied_keeps_its_code_through_frames() {
        let err = FrameError::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.exit_code(), PERMISSION_DENIED);
    }
}
