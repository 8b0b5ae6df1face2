//! Registry routing component interactions to their executors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::config::SwitchboardConfig;
use crate::context::{ComponentContext, Responder};
use crate::custom_id;
use crate::error::{ExecutorError, RegistryError, ValidationError};
use crate::executor::ComponentExecutor;
use crate::ids::MessageId;
use crate::platform::{
    ComponentInteractionEvent, InteractionResponse, InteractionTransport, ResponseKind,
};
use crate::registry::{DispatchOutcome, Entry, RegisterOptions, Registration, RegistrationRef};

type ComponentEntry = Entry<dyn ComponentExecutor>;

#[derive(Default)]
struct Maps {
    by_match: HashMap<String, Arc<ComponentEntry>>,
    by_message: HashMap<MessageId, Arc<ComponentEntry>>,
}

impl Maps {
    /// Remove every index pointing at this exact entry.
    fn remove_entry(&mut self, entry: &Arc<ComponentEntry>) {
        for id_match in &entry.matches {
            if self
                .by_match
                .get(id_match)
                .is_some_and(|existing| Arc::ptr_eq(existing, entry))
            {
                self.by_match.remove(id_match);
            }
        }
        if let Some(message_id) = entry.message_id {
            if self
                .by_message
                .get(&message_id)
                .is_some_and(|existing| Arc::ptr_eq(existing, entry))
            {
                self.by_message.remove(&message_id);
            }
        }
    }
}

struct Inner {
    maps: RwLock<Maps>,
    static_exact: DashMap<String, Arc<dyn ComponentExecutor>>,
    static_prefix: DashMap<String, Arc<dyn ComponentExecutor>>,
    transport: Arc<dyn InteractionTransport>,
    sweep_interval: Duration,
    response_timeout: Duration,
    gc_task: StdMutex<Option<JoinHandle<()>>>,
}

/// Registry mapping component custom IDs to executors.
///
/// Cheap to clone; clones share the same state and sweep task.
#[derive(Clone)]
pub struct ComponentRegistry {
    inner: Arc<Inner>,
}

impl ComponentRegistry {
    pub fn new(transport: Arc<dyn InteractionTransport>) -> Self {
        Self::with_config(transport, &SwitchboardConfig::default())
    }

    pub fn with_config(transport: Arc<dyn InteractionTransport>, config: &SwitchboardConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                maps: RwLock::new(Maps::default()),
                static_exact: DashMap::new(),
                static_prefix: DashMap::new(),
                transport,
                sweep_interval: config.sweep_interval,
                response_timeout: config.response_timeout,
                gc_task: StdMutex::new(None),
            }),
        }
    }

    /// Start the background sweep task. Idempotent.
    pub fn open(&self) {
        let mut task = self.inner.gc_task.lock().expect("gc task lock poisoned");
        if task.is_some() {
            return;
        }

        let inner = self.inner.clone();
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.sweep_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                sweep(&inner).await;
            }
        }));
    }

    /// Cancel the sweep task and drop all live registrations. Idempotent;
    /// in-flight dispatches are left to complete.
    pub async fn close(&self) {
        let task = self
            .inner
            .gc_task
            .lock()
            .expect("gc task lock poisoned")
            .take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }

        let mut maps = self.inner.maps.write().await;
        maps.by_match.clear();
        maps.by_message.clear();
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .gc_task
            .lock()
            .expect("gc task lock poisoned")
            .is_some()
    }

    /// Register an executor under the match keys it declares.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Conflict`] when any match key (or the target
    /// message) already has an active registration in an overlapping scope;
    /// [`ValidationError`] for malformed match keys or an ambiguous
    /// `match_override`.
    pub async fn register(
        &self,
        executor: Arc<dyn ComponentExecutor>,
        options: RegisterOptions,
    ) -> Result<RegistrationRef, RegistryError> {
        let mut matches = executor.custom_ids();
        if let Some(id_match) = options.match_override {
            if matches.len() != 1 {
                return Err(ValidationError::AmbiguousOverride.into());
            }
            matches = vec![id_match];
        }
        if matches.is_empty() {
            return Err(ValidationError::EmptyMatch.into());
        }
        for id_match in &matches {
            custom_id::validate_match(id_match)?;
        }

        let registration = Registration::new(options.timeout, options.max_uses, Instant::now());
        let entry = Arc::new(ComponentEntry::new(
            matches.clone(),
            options.message_id,
            executor,
            registration,
        ));

        let mut maps = self.inner.maps.write().await;
        for id_match in &matches {
            if maps.by_match.contains_key(id_match) || self.inner.static_exact.contains_key(id_match)
            {
                return Err(RegistryError::Conflict {
                    custom_id: id_match.clone(),
                });
            }
        }
        if let Some(message_id) = options.message_id {
            if maps.by_message.contains_key(&message_id) {
                return Err(RegistryError::Conflict {
                    custom_id: format!("message:{message_id}"),
                });
            }
        }

        for id_match in &matches {
            maps.by_match.insert(id_match.clone(), entry.clone());
        }
        if let Some(message_id) = options.message_id {
            maps.by_message.insert(message_id, entry);
        }

        Ok(RegistrationRef {
            matches,
            message_id: options.message_id,
        })
    }

    /// Remove the registration answering to `id_match`.
    pub async fn deregister(&self, id_match: &str) -> Result<(), RegistryError> {
        let mut maps = self.inner.maps.write().await;
        let entry = maps
            .by_match
            .get(id_match)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                key: id_match.to_owned(),
            })?;
        maps.remove_entry(&entry);
        Ok(())
    }

    /// Remove the registration bound to `message_id`.
    pub async fn deregister_message(&self, message_id: MessageId) -> Result<(), RegistryError> {
        let mut maps = self.inner.maps.write().await;
        let entry = maps
            .by_message
            .get(&message_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                key: format!("message:{message_id}"),
            })?;
        maps.remove_entry(&entry);
        Ok(())
    }

    /// Register a constant route with no expiry.
    ///
    /// Static identifiers survive process restarts, so `custom_id` must be
    /// derived deterministically by the caller. With `prefix_match` the
    /// route answers to every match portion starting with `custom_id`.
    pub async fn register_static(
        &self,
        custom_id: impl Into<String>,
        executor: Arc<dyn ComponentExecutor>,
        prefix_match: bool,
    ) -> Result<(), RegistryError> {
        let custom_id = custom_id.into();
        custom_id::validate_match(&custom_id)?;

        let maps = self.inner.maps.read().await;
        if maps.by_match.contains_key(&custom_id)
            || self.inner.static_exact.contains_key(&custom_id)
            || self.inner.static_prefix.contains_key(&custom_id)
        {
            return Err(RegistryError::Conflict { custom_id });
        }

        if prefix_match {
            self.inner.static_prefix.insert(custom_id, executor);
        } else {
            self.inner.static_exact.insert(custom_id, executor);
        }
        Ok(())
    }

    /// Remove a constant route.
    pub fn deregister_static(&self, custom_id: &str) -> Result<(), RegistryError> {
        if self.inner.static_exact.remove(custom_id).is_some()
            || self.inner.static_prefix.remove(custom_id).is_some()
        {
            return Ok(());
        }
        Err(RegistryError::NotFound {
            key: custom_id.to_owned(),
        })
    }

    /// Whether any live registration answers to `id_match`.
    pub async fn contains(&self, id_match: &str) -> bool {
        self.inner.maps.read().await.by_match.contains_key(id_match)
            || self.inner.static_exact.contains_key(id_match)
    }

    /// Dispatch a gateway-delivered event; responses go out through the
    /// transport.
    pub async fn dispatch(&self, event: ComponentInteractionEvent) -> DispatchOutcome {
        let (id_match, id_metadata) = split_owned(&event.custom_id);

        if let Some(executor) = self.find_static(&id_match) {
            let ctx = self.context(event, id_match, id_metadata, None);
            execute_static(&*executor, ctx).await;
            return DispatchOutcome::Dispatched;
        }

        let Some(entry) = self.resolve(&id_match, event.message_id).await else {
            self.send_expired_notice(&event).await;
            return DispatchOutcome::ExpiredOrUnknown;
        };

        let ctx = self.context(event, id_match, id_metadata, None);
        self.invoke(entry, ctx).await;
        DispatchOutcome::Dispatched
    }

    /// Dispatch an HTTP-delivered event and resolve the payload the HTTP
    /// response should carry.
    pub async fn dispatch_rest(&self, event: ComponentInteractionEvent) -> InteractionResponse {
        let (id_match, id_metadata) = split_owned(&event.custom_id);

        if let Some(executor) = self.find_static(&id_match) {
            let (tx, rx) = oneshot::channel();
            let ctx = self.context(event, id_match, id_metadata, Some(tx));
            tokio::spawn(async move { execute_static(&*executor, ctx).await });
            return self.await_response(rx).await;
        }

        let Some(entry) = self.resolve(&id_match, event.message_id).await else {
            return InteractionResponse::expired_notice();
        };

        let (tx, rx) = oneshot::channel();
        let ctx = self.context(event, id_match, id_metadata, Some(tx));
        let registry = self.clone();
        tokio::spawn(async move { registry.invoke(entry, ctx).await });
        self.await_response(rx).await
    }

    fn find_static(&self, id_match: &str) -> Option<Arc<dyn ComponentExecutor>> {
        if let Some(executor) = self.inner.static_exact.get(id_match) {
            return Some(executor.clone());
        }
        self.inner
            .static_prefix
            .iter()
            .find(|entry| id_match.starts_with(entry.key().as_str()))
            .map(|entry| entry.value().clone())
    }

    /// Resolve a dynamic registration and apply use bookkeeping, all under
    /// one write lock so a depleted or expired entry can never be resolved
    /// twice. Message-scoped registrations win over global ones.
    async fn resolve(
        &self,
        id_match: &str,
        message_id: Option<MessageId>,
    ) -> Option<Arc<ComponentEntry>> {
        let now = Instant::now();
        let mut maps = self.inner.maps.write().await;

        let entry = message_id
            .and_then(|id| maps.by_message.get(&id))
            .filter(|entry| entry.matches.iter().any(|m| m == id_match))
            .or_else(|| {
                maps.by_match
                    .get(id_match)
                    .filter(|entry| entry.message_id.is_none())
            })
            .cloned()?;

        {
            let mut state = entry.state.lock().expect("registration lock poisoned");
            if state.is_expired(now) {
                maps.remove_entry(&entry);
                return None;
            }
            state.on_use(now);
            if state.is_depleted() {
                // This dispatch consumed the final use.
                maps.remove_entry(&entry);
            }
        }

        Some(entry)
    }

    async fn invoke(&self, entry: Arc<ComponentEntry>, ctx: ComponentContext) {
        match entry.executor.execute(ctx).await {
            Ok(()) => {}
            Err(ExecutorError::Closed) => {
                debug!("component executor requested closure");
                self.inner.maps.write().await.remove_entry(&entry);
            }
            Err(error) => error!(error = %error, "component executor failed"),
        }
    }

    fn context(
        &self,
        event: ComponentInteractionEvent,
        id_match: String,
        id_metadata: Option<String>,
        response_tx: Option<oneshot::Sender<InteractionResponse>>,
    ) -> ComponentContext {
        let responder = Responder::new(
            Some(self.inner.transport.clone()),
            response_tx,
            event.interaction_id,
            event.application_id,
            event.token.clone(),
        );
        ComponentContext::new(event, id_match, id_metadata, responder)
    }

    async fn send_expired_notice(&self, event: &ComponentInteractionEvent) {
        if let Err(error) = self
            .inner
            .transport
            .create_response(
                event.interaction_id,
                &event.token,
                InteractionResponse::expired_notice(),
            )
            .await
        {
            error!(error = %error, "failed to send expired-component notice");
        }
    }

    async fn await_response(
        &self,
        rx: oneshot::Receiver<InteractionResponse>,
    ) -> InteractionResponse {
        match tokio::time::timeout(self.inner.response_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) | Err(_) => {
                warn!("executor produced no initial response within the REST deadline");
                InteractionResponse::new(ResponseKind::DeferredMessageUpdate, None)
            }
        }
    }
}

fn split_owned(custom_id: &str) -> (String, Option<String>) {
    let (id_match, id_metadata) = custom_id::split(custom_id);
    (id_match.to_owned(), id_metadata.map(str::to_owned))
}

async fn execute_static(executor: &dyn ComponentExecutor, ctx: ComponentContext) {
    match executor.execute(ctx).await {
        Ok(()) => {}
        Err(ExecutorError::Closed) => {
            warn!("static executor signalled closure; static routes never expire")
        }
        Err(error) => error!(error = %error, "static component executor failed"),
    }
}

/// One eviction pass over the dynamic registrations.
async fn sweep(inner: &Arc<Inner>) {
    let now = Instant::now();
    let mut maps = inner.maps.write().await;

    let mut expired: Vec<Arc<ComponentEntry>> = Vec::new();
    for entry in maps.by_match.values() {
        if entry.is_expired(now) && !expired.iter().any(|seen| Arc::ptr_eq(seen, entry)) {
            expired.push(entry.clone());
        }
    }

    if expired.is_empty() {
        return;
    }

    let evicted = expired.len();
    for entry in expired {
        maps.remove_entry(&entry);
    }
    debug!(evicted, "sweep evicted expired component registrations");
}
