//! Opaque tokens handed to page script.
//!
//! Every token is 32 random bytes rendered as lowercase hex. A token carries no
//! information about what it refers to; the only way to use it is to present it
//! back to the binding.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

const TOKEN_BYTES: usize = 32;
const LOG_PREFIX_LEN: usize = 8;

/// 256 bits from the thread-local CSPRNG, hex encoded.
pub(crate) fn random_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

macro_rules! token_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Borrow the token as sent over the wire.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Shortened form for logs.
            pub(crate) fn short(&self) -> &str {
                // Page-supplied tokens may be arbitrary UTF-8.
                let end = self
                    .0
                    .char_indices()
                    .nth(LOG_PREFIX_LEN)
                    .map_or(self.0.len(), |(i, _)| i);
                &self.0[..end]
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        // Tokens are capabilities: keep them out of Debug output.
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}…)", stringify!($name), self.short())
            }
        }
    };
}

token_type! {
    /// Capability token standing in for a native resource.
    Handle
}

token_type! {
    /// Links an outbound authorisation request to its eventual reply.
    CorrelationId
}

impl Handle {
    pub(crate) fn generate() -> Self {
        Self(random_token())
    }
}

impl CorrelationId {
    pub(crate) fn generate() -> Self {
        Self(random_token())
    }
}

/// Identifies one browser tab/page lifetime. Used only for bulk cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabGroupId(String);

impl TabGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
