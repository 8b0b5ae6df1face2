//! # Interaction Registries
//!
//! Registries map custom-identifier match keys to executors and own their
//! lifetime: registrations are created by `register`, evicted by the
//! background sweep once their expiry policy lapses, destroyed on explicit
//! deregistration, and closed down by the executor itself signalling
//! [`ExecutorError::Closed`](crate::error::ExecutorError::Closed).
//!
//! All map mutation (register / deregister / sweep eviction / use
//! bookkeeping) happens under one `RwLock` write so concurrent dispatch
//! lookups never observe a partially-removed or partially-inserted entry.
//! Dispatches themselves run independently; the registry never serializes
//! executor invocations.
//!
//! Lookup precedence is static-exact, then static-prefix, then
//! message-scoped, then global match. Static identifiers are constant
//! routes with no expiry, meant to be derived deterministically so they
//! keep resolving after a process restart.

use std::sync::Mutex as StdMutex;

use tokio::time::Instant;

use crate::ids::MessageId;
use crate::timeout::Timeout;

pub mod component;
pub mod modal;

pub use component::ComponentRegistry;
pub use modal::ModalRegistry;

/// Outcome of dispatching one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A registration was found and its executor was invoked.
    Dispatched,
    /// No live registration matched; the user got an ephemeral
    /// "no longer available" notice instead.
    ExpiredOrUnknown,
}

/// Options accepted by `register`.
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Replace the executor's declared match key. Only valid for executors
    /// declaring exactly one custom ID.
    pub match_override: Option<String>,
    /// Expiry policy; defaults to a sliding 30 second window.
    pub timeout: Timeout,
    /// Evict after this many successful dispatches.
    pub max_uses: Option<u32>,
    /// Bind the registration to a specific message.
    pub message_id: Option<MessageId>,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn match_override(mut self, id_match: impl Into<String>) -> Self {
        self.match_override = Some(id_match.into());
        self
    }

    pub fn max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    /// Evict after the first successful dispatch.
    pub fn single_use(self) -> Self {
        self.max_uses(1)
    }

    pub fn message(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }
}

/// Bookkeeping record of one live registration.
#[derive(Debug, Clone)]
pub struct Registration {
    created_at: Instant,
    last_used_at: Instant,
    use_count: u32,
    max_uses: Option<u32>,
    timeout: Timeout,
}

impl Registration {
    pub(crate) fn new(timeout: Timeout, max_uses: Option<u32>, now: Instant) -> Self {
        Self {
            created_at: now,
            last_used_at: now,
            use_count: 0,
            max_uses,
            timeout,
        }
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_used_at(&self) -> Instant {
        self.last_used_at
    }

    pub fn use_count(&self) -> u32 {
        self.use_count
    }

    pub(crate) fn is_depleted(&self) -> bool {
        self.max_uses.is_some_and(|max_uses| self.use_count >= max_uses)
    }

    /// Whether this registration should no longer be dispatched to.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.is_depleted()
            || self
                .timeout
                .is_expired(self.created_at, self.last_used_at, now)
    }

    /// Record a successful dispatch; sliding policies refresh their window.
    pub(crate) fn on_use(&mut self, now: Instant) {
        self.use_count = self.use_count.saturating_add(1);
        if self.timeout.refreshes_on_use() {
            self.last_used_at = now;
        }
    }
}

/// Reference to a completed registration, usable for later deregistration.
#[derive(Debug, Clone)]
pub struct RegistrationRef {
    pub matches: Vec<String>,
    pub message_id: Option<MessageId>,
}

/// Map entry shared between the match index and the message index.
pub(crate) struct Entry<E: ?Sized> {
    pub(crate) matches: Vec<String>,
    pub(crate) message_id: Option<MessageId>,
    pub(crate) executor: std::sync::Arc<E>,
    pub(crate) state: StdMutex<Registration>,
}

impl<E: ?Sized> Entry<E> {
    pub(crate) fn new(
        matches: Vec<String>,
        message_id: Option<MessageId>,
        executor: std::sync::Arc<E>,
        registration: Registration,
    ) -> Self {
        Self {
            matches,
            message_id,
            executor,
            state: StdMutex::new(registration),
        }
    }

    /// Expired-or-depleted check against the shared bookkeeping record.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.state.lock().expect("registration lock poisoned").is_expired(now)
    }
}
