//! Connection greeting between a dealer and a router.
//!
//! The dealer opens with a single-segment JSON frame announcing its protocol,
//! version and identity; the router answers with its protocol and version.
//! The identity learned here is what the router prefixes to every frame read
//! from that connection.

use std::io::{Read, Write};
use std::time::Instant;

use easynet_frame::{Frame, FrameError, FrameReader, FrameWriter};
use serde::{Deserialize, Serialize};

use crate::config::SocketConfig;
use crate::error::{Result, TransportError};
use crate::identity::Identity;

const MAX_PROTOCOL_LEN: usize = 32;
const MAX_VERSION_LEN: usize = 16;

/// Greeting sent by the connecting side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GreetingRequest {
    pub protocol: String,
    pub version: String,
    pub identity: Identity,
}

/// Greeting reply sent by the bound side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GreetingReply {
    pub protocol: String,
    pub version: String,
}

/// Dealer side: announce `identity` and wait for the router's reply.
pub fn greet<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    identity: Identity,
    config: &SocketConfig,
) -> Result<GreetingReply> {
    validate_protocol_name(&config.protocol_name)?;
    validate_version(&config.protocol_version)?;

    let request = GreetingRequest {
        protocol: config.protocol_name.clone(),
        version: config.protocol_version.clone(),
        identity,
    };
    send_json(writer, &request)?;

    let payload = recv_greeting_payload(reader, config)?;
    let reply: GreetingReply = serde_json::from_slice(&payload)
        .map_err(|err| TransportError::Handshake(format!("unreadable reply: {err}")))?;

    validate_protocol_name(&reply.protocol)?;
    validate_version(&reply.version)?;
    if reply.protocol != config.protocol_name {
        return Err(TransportError::Handshake(format!(
            "unknown protocol '{}' (expected '{}')",
            reply.protocol, config.protocol_name
        )));
    }
    if !is_version_compatible(&config.protocol_version, &reply.version)? {
        return Err(TransportError::Handshake(format!(
            "incompatible version '{}' (local '{}')",
            reply.version, config.protocol_version
        )));
    }

    Ok(reply)
}

/// Router side: read the dealer's greeting, reply, and return its identity.
///
/// `admit` runs after the greeting validates and before the reply is sent, so
/// a rejected identity never sees a successful greeting.
pub fn accept_greeting<R, W, F>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    config: &SocketConfig,
    admit: F,
) -> Result<Identity>
where
    R: Read,
    W: Write,
    F: FnOnce(&Identity) -> Result<()>,
{
    let payload = recv_greeting_payload(reader, config)?;
    let request: GreetingRequest = serde_json::from_slice(&payload)
        .map_err(|err| TransportError::Handshake(format!("unreadable greeting: {err}")))?;

    validate_protocol_name(&request.protocol)?;
    validate_version(&request.version)?;
    if request.protocol != config.protocol_name {
        return Err(TransportError::Handshake(format!(
            "unknown protocol '{}' (expected '{}')",
            request.protocol, config.protocol_name
        )));
    }
    if !is_version_compatible(&request.version, &config.protocol_version)? {
        return Err(TransportError::Handshake(format!(
            "incompatible version '{}' (server '{}')",
            request.version, config.protocol_version
        )));
    }

    admit(&request.identity)?;

    let reply = GreetingReply {
        protocol: config.protocol_name.clone(),
        version: config.protocol_version.clone(),
    };
    send_json(writer, &reply)?;

    Ok(request.identity)
}

fn send_json<T: Serialize, W: Write>(writer: &mut FrameWriter<W>, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value)
        .map_err(|err| TransportError::Handshake(format!("greeting encode failed: {err}")))?;
    writer.write_frame(&Frame::from_segments([payload]))?;
    Ok(())
}

fn recv_greeting_payload<R: Read>(
    reader: &mut FrameReader<R>,
    config: &SocketConfig,
) -> Result<Vec<u8>> {
    // `None` when the timeout overflows `Instant`: wait indefinitely.
    let deadline = Instant::now().checked_add(config.greeting_timeout);
    loop {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(TransportError::Handshake(format!(
                "timed out after {:?}",
                config.greeting_timeout
            )));
        }

        match reader.read_frame() {
            Ok(frame) => {
                let [payload] = frame.segments() else {
                    return Err(TransportError::Handshake(format!(
                        "greeting must be a single segment, got {}",
                        frame.len()
                    )));
                };
                if payload.len() > config.max_greeting_payload {
                    return Err(TransportError::Handshake(format!(
                        "greeting too large: {} (max {})",
                        payload.len(),
                        config.max_greeting_payload
                    )));
                }
                return Ok(payload.to_vec());
            }
            Err(err) if err.is_timeout() => continue,
            Err(FrameError::ConnectionClosed) => {
                return Err(TransportError::Handshake(
                    "connection closed during greeting".to_string(),
                ));
            }
            Err(err) => return Err(TransportError::Frame(err)),
        }
    }
}

fn validate_protocol_name(protocol: &str) -> Result<()> {
    if protocol.is_empty() || protocol.len() > MAX_PROTOCOL_LEN {
        return Err(TransportError::Handshake(format!(
            "invalid protocol name length: {}",
            protocol.len()
        )));
    }
    Ok(())
}

fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() || version.len() > MAX_VERSION_LEN {
        return Err(TransportError::Handshake(format!(
            "invalid protocol version length: {}",
            version.len()
        )));
    }
    let _ = parse_version(version)?;
    Ok(())
}

fn is_version_compatible(client_version: &str, server_version: &str) -> Result<bool> {
    let (client_major, client_minor) = parse_version(client_version)?;
    let (server_major, server_minor) = parse_version(server_version)?;

    Ok(client_major == server_major && client_minor >= server_minor)
}

fn parse_version(version: &str) -> Result<(u16, u16)> {
    let (major, minor) = version.split_once('.').ok_or_else(|| {
        TransportError::Handshake(format!("invalid version '{version}': expected major.minor"))
    })?;
    let major = major.parse::<u16>().map_err(|_| {
        TransportError::Handshake(format!("invalid version '{version}': bad major"))
    })?;
    let minor = minor.parse::<u16>().map_err(|_| {
        TransportError::Handshake(format!("invalid version '{version}': bad minor"))
    })?;
    Ok((major, minor))
}
