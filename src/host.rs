//! Length-prefixed JSON framing and the inbound Authenticator pump.
//!
//! Frames are a 4-byte native-endian `u32` length followed by that many bytes
//! of UTF-8 JSON, the same framing browsers use for native messaging. When the
//! Authenticator channel runs over stdio, stdout carries only frames: log to
//! stderr.

use std::io::{self, Read};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::binding::SafeBinding;
use crate::transport::AuthenticatorMessage;

pub const MAX_OUTBOUND: usize = 1_048_576; // 1 MiB (binding -> Authenticator)
pub const MAX_INBOUND: usize = 64 * 1_048_576; // 64 MiB (Authenticator -> binding)

#[inline]
fn read_exact_u32_len<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf)?;
    Ok(u32::from_ne_bytes(len_buf))
}

/// Encode any serde-serializable value into a frame:
/// 4-byte native-endian length + JSON bytes.
pub fn encode_message<T: Serialize>(msg: &T) -> io::Result<Vec<u8>> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_OUTBOUND {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "outgoing message exceeds 1MB",
        ));
    }
    let mut out = Vec::with_capacity(4 + json.len());
    out.extend_from_slice(&(json.len() as u32).to_ne_bytes());
    out.extend_from_slice(&json);
    Ok(out)
}

/// Decode a single frame from a reader.
pub fn decode_message<R: Read>(reader: &mut R, max_size: usize) -> io::Result<String> {
    let len = read_exact_u32_len(&mut *reader)? as usize;
    let cap = max_size.min(MAX_INBOUND);
    if len > cap {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "incoming message too large",
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Read the next Authenticator message.
///
/// `Ok(None)` means the peer disconnected (EOF, including inside a truncated
/// last frame). A complete frame whose body is not UTF-8, or not an
/// Authenticator message, is an `InvalidData` error; the stream stays usable.
/// An oversized frame is also `InvalidData` but leaves the stream unusable.
pub fn read_authenticator_message<R: Read>(
    reader: &mut R,
) -> io::Result<Option<AuthenticatorMessage>> {
    let raw = match decode_message(reader, MAX_INBOUND) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Feed Authenticator replies from `reader` into the binding's queues until
/// the peer disconnects.
///
/// Reads run on the blocking pool. Malformed frames (bad UTF-8 or JSON that
/// is not a reply) are logged and skipped; an oversized frame ends the pump
/// with an error, since the stream can no longer be resynchronised.
pub async fn pump_inbound<R>(reader: R, binding: Arc<SafeBinding>) -> io::Result<()>
where
    R: Read + Send + 'static,
{
    let mut reader = reader;
    loop {
        let (back, next) = tokio::task::spawn_blocking(move || {
            let next = read_authenticator_message(&mut reader);
            (reader, next)
        })
        .await
        .map_err(io::Error::other)?;
        reader = back;

        match next {
            Ok(Some(message)) => {
                if !binding.handle_authenticator_message(message) {
                    debug!("Authenticator reply matched no in-flight request");
                }
            }
            Ok(None) => {
                debug!("Authenticator disconnected");
                return Ok(());
            }
            Err(e) if is_malformed_frame(&e) => {
                warn!(error = %e, "skipping malformed Authenticator message");
            }
            Err(e) => return Err(e),
        }
    }
}

/// A complete frame whose body was not UTF-8 or not an Authenticator message.
fn is_malformed_frame(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::InvalidData
        && e.get_ref().is_some_and(|inner| {
            inner.is::<serde_json::Error>() || inner.is::<std::string::FromUtf8Error>()
        })
}

/// [`pump_inbound`] over stdin.
pub async fn event_loop(binding: Arc<SafeBinding>) -> io::Result<()> {
    pump_inbound(io::stdin(), binding).await
}
