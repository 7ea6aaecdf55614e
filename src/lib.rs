//! # safe_app_binding
//!
//! The native side of a browser plugin that lets web pages use the SAFE
//! Network:
//!
//! - Hand pages **opaque handles** instead of native objects, and free them
//!   (with everything they own) when asked or when the tab goes away
//! - Run **authorisation requests** through the Authenticator one at a time,
//!   matching replies by correlation id
//! - Speak to the Authenticator over **length-prefixed JSON** on stdio, or over
//!   an in-process channel
//!
//! ---
//!
//! ## Handles
//!
//! Every native object a page can see (application instances, mutable data,
//! entries, NFS emulations, files, keys) lives in the [`HandleRegistry`]. The
//! page only ever holds a [`Handle`]: a random 256-bit token, hex encoded.
//!
//! Handles form a tree. An application instance is a root; anything obtained
//! through a handle is owned by it:
//!
//! ```text
//! app ─┬─ mutable data ─┬─ entries
//!      │                └─ nfs ── file
//!      └─ key pair ─┬─ public enc key
//!                   └─ secret enc key
//! ```
//!
//! Freeing a handle frees the whole subtree under it. Only application
//! instances have a native release step. If it fails, the application's own
//! handle is put back so the page can retry (what it owned stays freed) and
//! the page gets [`BindingError::ResourceRelease`].
//!
//! Each application instance belongs to the tab that created it (its
//! [`TabGroupId`]). [`SafeBinding::on_tab_closed`] frees every app of a tab
//! and drops its queued authorisation requests.
//!
//! ---
//!
//! ## Authorisation
//!
//! Authorisation prompts are shown to the user one at a time. There are two
//! FIFO queues, one for unregistered (read-only) connections and one for
//! registered ones. Each has at most one request in flight:
//!
//! 1. [`SafeBinding::connect`] / [`SafeBinding::authorise`] enqueue a request
//!    and wait on a [`PendingAuth`].
//! 2. The queue sends `{correlationId, uri, isUnregistered}` over the
//!    [`AuthTransport`].
//! 3. The Authenticator replies with `{correlationId, result}` or
//!    `{correlationId, error}`; hand every reply to
//!    [`SafeBinding::handle_authenticator_message`] (the [`pump_inbound`]
//!    loop does this for a framed reader).
//! 4. A reply that does not name the in-flight request is ignored.
//!
//! The user declining a prompt arrives as the error `"unauthorised"`. By
//! default the caller gets [`BindingError::Declined`]; with
//! [`DeclinePolicy::Swallow`] the caller is left pending until its tab closes.
//! Either way the queue moves on.
//!
//! ---
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use safe_app_binding::native::{AppInfo, InitOptions, NativeLibrary};
//! use safe_app_binding::transport::FramedTransport;
//! use safe_app_binding::{event_loop, BindingConfig, PageContext, SafeBinding, TabGroupId};
//!
//! # async fn run(library: Arc<dyn NativeLibrary>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = BindingConfig::load("safe_app_binding.toml")?;
//! safe_app_binding::logging::init(&config.log)?;
//!
//! let binding = Arc::new(SafeBinding::new(
//!     library,
//!     Arc::new(FramedTransport::stdout()),
//!     config,
//! ));
//! binding.spawn_timeout_reaper();
//! tokio::spawn(event_loop(Arc::clone(&binding)));
//!
//! let page = PageContext::new(TabGroupId::new("tab-1"), "safe://hello.world");
//! let info = AppInfo {
//!     id: "net.example.app".into(),
//!     name: "Example".into(),
//!     vendor: "Example Ltd.".into(),
//!     scope: None,
//! };
//! let (app, _network_states) = binding.initialise(&page, info, InitOptions::default()).await?;
//! binding.connect(&app).await?;
//! let content = binding.web_fetch(&app, "safe://hello.world/index.html").await?;
//! eprintln!("fetched {} bytes", content.len());
//!
//! binding.on_tab_closed(&page.tab_group);
//! # Ok(())
//! # }
//! ```
//!
//! ### Never log to stdout
//!
//! With [`FramedTransport::stdout`](transport::FramedTransport::stdout) the
//! Authenticator channel is stdout. Any other write there corrupts the frame
//! stream. [`logging::init`] writes to stderr.
//!
//! ---
//!
//! ## Framing
//!
//! ```rust
//! use safe_app_binding::{decode_message, encode_message, MAX_INBOUND};
//! use serde_json::json;
//! use std::io::Cursor;
//!
//! let msg = json!({"correlationId": "ab12", "result": "safe-auth:granted"});
//! let frame = encode_message(&msg).unwrap();
//!
//! let mut cur = Cursor::new(frame);
//! let raw = decode_message(&mut cur, MAX_INBOUND).unwrap();
//! let back: serde_json::Value = serde_json::from_str(&raw).unwrap();
//! assert_eq!(back, msg);
//! ```
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`binding`]: the [`SafeBinding`] context and tab lifecycle.
//! - [`api`]: page-facing operations (`safeApp`, `safeCrypto`, `safeMutableData`, `safeNfs`).
//! - [`registry`], [`handle`], [`resource`]: the handle table.
//! - [`queue`], [`transport`], [`host`]: the Authenticator channel.
//! - [`native`]: traits the native SAFE library implements.
//! - [`manifest`]: which methods are `sync`, `promise` or `readable`.
//! - [`config`], [`logging`], [`error`].

pub mod api;
pub mod binding;
pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod logging;
pub mod manifest;
pub mod native;
pub mod queue;
pub mod readable;
pub mod registry;
pub mod resource;
pub mod transport;

#[doc(inline)]
pub use binding::{PageContext, SafeBinding, TabCleanup};
#[doc(inline)]
pub use config::BindingConfig;
#[doc(inline)]
pub use error::{BindingError, BindingResult, NativeError};
#[doc(inline)]
pub use handle::{CorrelationId, Handle, TabGroupId};
#[doc(inline)]
pub use host::{
    decode_message, encode_message, event_loop, pump_inbound, MAX_INBOUND, MAX_OUTBOUND,
};
#[doc(inline)]
pub use manifest::MethodKind;
#[doc(inline)]
pub use queue::{AuthKind, DeclinePolicy, PendingAuth};
#[doc(inline)]
pub use readable::Readable;
#[doc(inline)]
pub use registry::HandleRegistry;
#[doc(inline)]
pub use transport::{AuthTransport, AuthenticatorMessage};
