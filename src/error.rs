//! Error types for the binding.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::resource::ResourceKind;

/// A failure reported by the native library. Passed through to the page unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NativeError {
    message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Everything a binding operation can fail with.
///
/// Each error is scoped to the one request that produced it; nothing here
/// takes the process down.
#[derive(Debug, Error)]
pub enum BindingError {
    /// Unknown, freed or forged handle.
    #[error("invalid handle")]
    InvalidHandle,

    /// The handle exists but points at a different kind of resource.
    #[error("handle does not refer to a {expected} resource (found {found})")]
    WrongResourceKind {
        expected: ResourceKind,
        found: ResourceKind,
    },

    /// Key operations accept a signing key or either encryption key.
    #[error("handle does not refer to a key (found {found})")]
    NotAKey { found: ResourceKind },

    /// Application instances are roots and cannot be owned.
    #[error("application instances cannot be owned by another handle")]
    OwnedApplication,

    /// The Authenticator channel did not accept the outbound request.
    #[error("could not send request to the Authenticator: {0}")]
    TransportSend(String),

    /// Explicit error payload from the Authenticator.
    #[error("Authenticator error: {0}")]
    Authenticator(String),

    /// The user declined the authorisation prompt.
    #[error("authorisation request was declined")]
    Declined,

    #[error("authorisation request timed out after {0:?}")]
    Timeout(Duration),

    /// The request was dropped before it completed (tab closed).
    #[error("authorisation request was cancelled")]
    Cancelled,

    /// `emulateAs` was asked for an emulation the binding does not provide.
    #[error("unsupported emulation: {0}")]
    UnsupportedEmulation(String),

    #[error("native operation failed: {0}")]
    NativeOperation(#[from] NativeError),

    /// The native release of an application failed; its handle is still live.
    #[error("failed to release native resource: {0}")]
    ResourceRelease(NativeError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using [`BindingError`].
pub type BindingResult<T> = Result<T, BindingError>;
