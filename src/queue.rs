//! Authorisation request queue.
//!
//! The Authenticator shows one interactive prompt at a time, so requests from
//! every page are serialized: at most one is in flight, the rest wait in FIFO
//! order. Each request gets a fresh [`CorrelationId`]; a reply is matched
//! against the in-flight request's id only, so stale, duplicate or spoofed
//! replies are dropped without touching queue state.
//!
//! Unregistered (connect) and registered (authorise) requests use two
//! independent queues so a prompt the user ignores does not block anonymous
//! browsing.
//!
//! State machine per queue:
//!
//! ```text
//! Idle --enqueue/dispatch--> Dispatched --response|error|timeout--> Idle
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AuthSettings;
use crate::error::{BindingError, BindingResult};
use crate::handle::{CorrelationId, TabGroupId};
use crate::transport::{AuthRequestMessage, AuthTransport, AuthenticatorMessage};

/// Error payload the Authenticator sends when the user denies a prompt.
const DECLINED_ERROR: &str = "unauthorised";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthKind {
    /// Anonymous, read-only connection requests.
    Unregistered,
    /// Requests that ask the user to grant permissions.
    Registered,
}

/// What to do when the Authenticator reports the user declined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclinePolicy {
    /// Resolve the caller with [`BindingError::Declined`].
    #[default]
    Surface,
    /// Never resolve the caller. The request is parked until its tab group
    /// is cancelled; the queue still advances. A request enqueued without a
    /// tab group is resolved as under `Surface`.
    Swallow,
}

type Reply = oneshot::Sender<BindingResult<String>>;

struct AuthRequest {
    id: CorrelationId,
    uri: String,
    tab_group: Option<TabGroupId>,
    reply: Reply,
}

struct InFlight {
    request: AuthRequest,
    dispatched_at: Instant,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<AuthRequest>,
    in_flight: Option<InFlight>,
    parked: Vec<AuthRequest>,
}

impl QueueState {
    fn take_in_flight(&mut self, id: &CorrelationId) -> Option<AuthRequest> {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| &f.request.id == id)
        {
            self.in_flight.take().map(|f| f.request)
        } else {
            None
        }
    }
}

/// Resolves once the Authenticator answers the request.
///
/// Resolves to [`BindingError::Cancelled`] if the request is dropped without
/// an answer (its tab went away).
#[must_use = "the authorisation result is only observable through this future"]
pub struct PendingAuth {
    id: CorrelationId,
    rx: oneshot::Receiver<BindingResult<String>>,
}

impl PendingAuth {
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.id
    }

    /// Non-blocking check. `None` while the request is unresolved.
    ///
    /// Once this has returned `Some`, the value has been consumed: do not poll
    /// the future afterwards.
    pub fn try_result(&mut self) -> Option<BindingResult<String>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(BindingError::Cancelled)),
        }
    }
}

impl Future for PendingAuth {
    type Output = BindingResult<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(BindingError::Cancelled)))
    }
}

/// One serialized queue against the Authenticator.
pub struct AuthQueue {
    kind: AuthKind,
    transport: Arc<dyn AuthTransport>,
    timeout: Option<Duration>,
    decline_policy: DeclinePolicy,
    state: Mutex<QueueState>,
}

impl AuthQueue {
    pub fn new(
        kind: AuthKind,
        transport: Arc<dyn AuthTransport>,
        timeout: Option<Duration>,
        decline_policy: DeclinePolicy,
    ) -> Self {
        Self {
            kind,
            transport,
            timeout,
            decline_policy,
            state: Mutex::new(QueueState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self) -> AuthKind {
        self.kind
    }

    /// Append a request and dispatch it if the queue is idle.
    pub fn enqueue(&self, uri: impl Into<String>, tab_group: Option<TabGroupId>) -> PendingAuth {
        let (reply, rx) = oneshot::channel();
        let id = CorrelationId::generate();
        let mut state = self.state();
        state.pending.push_back(AuthRequest {
            id: id.clone(),
            uri: uri.into(),
            tab_group,
            reply,
        });
        debug!(
            kind = ?self.kind,
            id = id.short(),
            queued = state.pending.len(),
            "enqueued authorisation request"
        );
        self.dispatch_next(state);
        PendingAuth { id, rx }
    }

    /// Send the head of the queue unless a request is already in flight.
    /// A request the transport refuses is resolved with
    /// [`BindingError::TransportSend`] and the next one is tried.
    ///
    /// The request is marked in flight before the lock is released, and the
    /// transport is called without the lock held.
    fn dispatch_next<'a>(&'a self, mut state: MutexGuard<'a, QueueState>) {
        loop {
            if state.in_flight.is_some() {
                return;
            }
            let Some(request) = state.pending.pop_front() else {
                return;
            };
            let id = request.id.clone();
            let message = AuthRequestMessage {
                correlation_id: id.clone(),
                uri: request.uri.clone(),
                is_unregistered: self.kind == AuthKind::Unregistered,
            };
            state.in_flight = Some(InFlight {
                request,
                dispatched_at: Instant::now(),
            });
            drop(state);

            let sent = self.transport.send(&message);
            state = self.state();
            match sent {
                Ok(()) => {
                    debug!(kind = ?self.kind, id = id.short(), "dispatched to Authenticator");
                    return;
                }
                Err(e) => {
                    warn!(kind = ?self.kind, id = id.short(), error = %e, "Authenticator send failed");
                    if let Some(request) = state.take_in_flight(&id) {
                        let _ = request
                            .reply
                            .send(Err(BindingError::TransportSend(e.to_string())));
                    }
                }
            }
        }
    }

    /// Deliver a successful reply. Returns `false` (and changes nothing) if
    /// `id` is not the in-flight request.
    pub fn on_response(&self, id: &CorrelationId, result: String) -> bool {
        let mut state = self.state();
        let Some(request) = state.take_in_flight(id) else {
            debug!(kind = ?self.kind, id = id.short(), "ignoring reply for unknown request");
            return false;
        };
        debug!(kind = ?self.kind, id = id.short(), "Authenticator responded");
        let _ = request.reply.send(Ok(result));
        self.dispatch_next(state);
        true
    }

    /// Deliver an error reply. Same matching rules as [`on_response`](Self::on_response).
    pub fn on_error(&self, id: &CorrelationId, error: String) -> bool {
        let mut state = self.state();
        let Some(request) = state.take_in_flight(id) else {
            debug!(kind = ?self.kind, id = id.short(), "ignoring error for unknown request");
            return false;
        };

        if error.eq_ignore_ascii_case(DECLINED_ERROR) {
            match self.decline_policy {
                DeclinePolicy::Swallow if request.tab_group.is_some() => {
                    info!(kind = ?self.kind, id = id.short(), "authorisation declined, caller left pending");
                    state.parked.push(request);
                }
                // Nothing could ever cancel a parked request without a tab group.
                DeclinePolicy::Swallow | DeclinePolicy::Surface => {
                    info!(kind = ?self.kind, id = id.short(), "authorisation declined");
                    let _ = request.reply.send(Err(BindingError::Declined));
                }
            }
        } else {
            warn!(kind = ?self.kind, id = id.short(), error = %error, "Authenticator error");
            let _ = request.reply.send(Err(BindingError::Authenticator(error)));
        }
        self.dispatch_next(state);
        true
    }

    /// Drop every waiting request from `tab_group` without resolving it.
    /// The in-flight request is left alone. Returns the number dropped.
    pub fn cancel_group(&self, tab_group: &TabGroupId) -> usize {
        let mut state = self.state();
        let before = state.pending.len() + state.parked.len();
        state
            .pending
            .retain(|r| r.tab_group.as_ref() != Some(tab_group));
        state
            .parked
            .retain(|r| r.tab_group.as_ref() != Some(tab_group));
        let dropped = before - state.pending.len() - state.parked.len();
        if dropped > 0 {
            debug!(kind = ?self.kind, tab_group = %tab_group, dropped, "cancelled queued requests");
        }
        dropped
    }

    /// Time out the in-flight request if it has waited longer than the
    /// configured timeout. Returns `true` if it did.
    pub fn reap_expired(&self) -> bool {
        let Some(timeout) = self.timeout else {
            return false;
        };
        let mut state = self.state();
        let expired = state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.dispatched_at.elapsed() >= timeout);
        if !expired {
            return false;
        }
        if let Some(InFlight { request, .. }) = state.in_flight.take() {
            warn!(kind = ?self.kind, id = request.id.short(), ?timeout, "authorisation request timed out");
            let _ = request.reply.send(Err(BindingError::Timeout(timeout)));
        }
        self.dispatch_next(state);
        true
    }

    pub fn is_idle(&self) -> bool {
        self.state().in_flight.is_none()
    }

    pub fn in_flight(&self) -> Option<CorrelationId> {
        self.state()
            .in_flight
            .as_ref()
            .map(|f| f.request.id.clone())
    }

    /// Requests waiting behind the in-flight one.
    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    /// Declined requests held unresolved under [`DeclinePolicy::Swallow`].
    pub fn parked_len(&self) -> usize {
        self.state().parked.len()
    }
}

/// The two queues, keyed by [`AuthKind`], sharing one transport.
pub struct AuthQueues {
    unregistered: AuthQueue,
    registered: AuthQueue,
}

impl AuthQueues {
    pub fn new(transport: Arc<dyn AuthTransport>, settings: &AuthSettings) -> Self {
        let timeout = settings.timeout();
        Self {
            unregistered: AuthQueue::new(
                AuthKind::Unregistered,
                Arc::clone(&transport),
                timeout,
                settings.decline_policy,
            ),
            registered: AuthQueue::new(
                AuthKind::Registered,
                transport,
                timeout,
                settings.decline_policy,
            ),
        }
    }

    pub fn get(&self, kind: AuthKind) -> &AuthQueue {
        match kind {
            AuthKind::Unregistered => &self.unregistered,
            AuthKind::Registered => &self.registered,
        }
    }

    pub fn enqueue(
        &self,
        kind: AuthKind,
        uri: impl Into<String>,
        tab_group: Option<TabGroupId>,
    ) -> PendingAuth {
        self.get(kind).enqueue(uri, tab_group)
    }

    /// Route an inbound Authenticator message. The channel does not say which
    /// queue a reply belongs to, so both are offered it; at most one matches.
    pub fn dispatch_inbound(&self, message: AuthenticatorMessage) -> bool {
        match message {
            AuthenticatorMessage::Response {
                correlation_id,
                result,
            } => {
                self.unregistered.on_response(&correlation_id, result.clone())
                    || self.registered.on_response(&correlation_id, result)
            }
            AuthenticatorMessage::Error {
                correlation_id,
                error,
            } => {
                self.unregistered.on_error(&correlation_id, error.clone())
                    || self.registered.on_error(&correlation_id, error)
            }
        }
    }

    pub fn cancel_group(&self, tab_group: &TabGroupId) -> usize {
        self.unregistered.cancel_group(tab_group) + self.registered.cancel_group(tab_group)
    }

    /// Returns how many in-flight requests were timed out.
    pub fn reap_expired(&self) -> usize {
        usize::from(self.unregistered.reap_expired()) + usize::from(self.registered.reap_expired())
    }
}
