//! The binding's process-wide context.
//!
//! One [`SafeBinding`] owns the handle registry, both authorisation queues and
//! the native library. The embedder creates it once and shares it (usually as
//! an `Arc`) with every page-facing handler; tests build a fresh one each.

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BindingConfig;
use crate::handle::TabGroupId;
use crate::native::NativeLibrary;
use crate::queue::AuthQueues;
use crate::registry::HandleRegistry;
use crate::transport::{AuthTransport, AuthenticatorMessage};

/// The page an API call comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub tab_group: TabGroupId,
    /// Full URL of the calling page.
    pub url: Option<String>,
}

impl PageContext {
    pub fn new(tab_group: TabGroupId, url: impl Into<String>) -> Self {
        Self {
            tab_group,
            url: Some(url.into()),
        }
    }
}

/// What a tab teardown released.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TabCleanup {
    pub apps_freed: usize,
    pub requests_cancelled: usize,
}

pub struct SafeBinding {
    pub(crate) library: Arc<dyn NativeLibrary>,
    pub(crate) registry: HandleRegistry,
    pub(crate) queues: AuthQueues,
    config: BindingConfig,
}

impl SafeBinding {
    pub fn new(
        library: Arc<dyn NativeLibrary>,
        transport: Arc<dyn AuthTransport>,
        config: BindingConfig,
    ) -> Self {
        let queues = AuthQueues::new(transport, &config.auth);
        Self {
            library,
            registry: HandleRegistry::new(),
            queues,
            config,
        }
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub fn queues(&self) -> &AuthQueues {
        &self.queues
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Entry point for replies arriving on the Authenticator channel.
    pub fn handle_authenticator_message(&self, message: AuthenticatorMessage) -> bool {
        self.queues.dispatch_inbound(message)
    }

    /// The tab is gone: free its apps (and everything they own) and drop its
    /// queued authorisation requests. Requests already shown to the user are
    /// left to finish.
    pub fn on_tab_closed(&self, tab_group: &TabGroupId) -> TabCleanup {
        let cleanup = TabCleanup {
            requests_cancelled: self.queues.cancel_group(tab_group),
            apps_freed: self.registry.free_group(tab_group),
        };
        info!(
            tab_group = %tab_group,
            apps_freed = cleanup.apps_freed,
            requests_cancelled = cleanup.requests_cancelled,
            "tab closed"
        );
        cleanup
    }

    /// Navigation away from a page ends that page's handles just like a close.
    pub fn on_tab_navigated(&self, tab_group: &TabGroupId) -> TabCleanup {
        self.on_tab_closed(tab_group)
    }

    /// Time out overdue in-flight authorisation requests.
    pub fn reap_expired(&self) -> usize {
        self.queues.reap_expired()
    }

    /// Run [`reap_expired`](Self::reap_expired) on an interval until the
    /// binding is dropped. `None` when timeouts are disabled.
    pub fn spawn_timeout_reaper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.config.auth.timeout()?;
        let period = self.config.auth.reaper_interval();
        let weak: Weak<Self> = Arc::downgrade(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(binding) = weak.upgrade() else {
                    debug!("binding dropped, stopping timeout reaper");
                    return;
                };
                binding.reap_expired();
            }
        }))
    }
}
