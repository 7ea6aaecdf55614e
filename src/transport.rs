//! The channel to the Authenticator process.
//!
//! Outbound it carries exactly one [`AuthRequestMessage`] per dispatched
//! request. Inbound it delivers [`AuthenticatorMessage`]s, which are fed to
//! [`AuthQueues::dispatch_inbound`](crate::queue::AuthQueues::dispatch_inbound).
//! The channel is shared by every page, so replies are matched by correlation
//! id, never by arrival order.

use std::io::{self, Write};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::handle::CorrelationId;
use crate::host::encode_message;

/// Request sent to the Authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequestMessage {
    pub correlation_id: CorrelationId,
    pub uri: String,
    pub is_unregistered: bool,
}

/// Reply from the Authenticator: `{correlationId, result}` or `{correlationId, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthenticatorMessage {
    Response {
        #[serde(rename = "correlationId")]
        correlation_id: CorrelationId,
        result: String,
    },
    Error {
        #[serde(rename = "correlationId")]
        correlation_id: CorrelationId,
        error: String,
    },
}

impl AuthenticatorMessage {
    pub fn correlation_id(&self) -> &CorrelationId {
        match self {
            AuthenticatorMessage::Response { correlation_id, .. }
            | AuthenticatorMessage::Error { correlation_id, .. } => correlation_id,
        }
    }
}

/// Send side of the Authenticator channel. Fire-and-forget.
///
/// Queues call `send` without holding their state lock, so an implementation
/// may look at queue state, but `send` does block the calling task until it
/// returns.
pub trait AuthTransport: Send + Sync {
    fn send(&self, message: &AuthRequestMessage) -> io::Result<()>;
}

/// In-process transport backed by an unbounded tokio channel.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<AuthRequestMessage>,
}

impl ChannelTransport {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuthRequestMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AuthTransport for ChannelTransport {
    fn send(&self, message: &AuthRequestMessage) -> io::Result<()> {
        self.tx.send(message.clone()).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "Authenticator channel closed")
        })
    }
}

/// Writes length-prefixed JSON frames (see [`crate::host`]) to any writer.
///
/// The write happens inline on the caller's thread. Frames are capped at
/// 1 MiB, so on a pipe this is a short blocking write.
pub struct FramedTransport<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> FramedTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl FramedTransport<io::Stdout> {
    /// Frames on stdout. Nothing else may write to stdout once this is in use.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> AuthTransport for FramedTransport<W> {
    fn send(&self, message: &AuthRequestMessage) -> io::Result<()> {
        let frame = encode_message(message)?;
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        writer.write_all(&frame)?;
        writer.flush()
    }
}
