//! Registry routing modal submissions to their executors.
//!
//! Modals are keyed globally by match; there is no message scope because a
//! modal's custom ID is fixed when the form is opened.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::config::SwitchboardConfig;
use crate::context::{ModalContext, Responder};
use crate::custom_id;
use crate::error::{ExecutorError, RegistryError, ValidationError};
use crate::executor::ModalExecutor;
use crate::platform::{
    InteractionResponse, InteractionTransport, ModalInteractionEvent, ResponseKind,
};
use crate::registry::{DispatchOutcome, Entry, RegisterOptions, Registration, RegistrationRef};

type ModalEntry = Entry<dyn ModalExecutor>;

struct Inner {
    by_match: RwLock<HashMap<String, Arc<ModalEntry>>>,
    static_exact: DashMap<String, Arc<dyn ModalExecutor>>,
    static_prefix: DashMap<String, Arc<dyn ModalExecutor>>,
    transport: Arc<dyn InteractionTransport>,
    sweep_interval: Duration,
    response_timeout: Duration,
    gc_task: StdMutex<Option<JoinHandle<()>>>,
}

/// Registry mapping modal custom IDs to executors.
#[derive(Clone)]
pub struct ModalRegistry {
    inner: Arc<Inner>,
}

impl ModalRegistry {
    pub fn new(transport: Arc<dyn InteractionTransport>) -> Self {
        Self::with_config(transport, &SwitchboardConfig::default())
    }

    pub fn with_config(transport: Arc<dyn InteractionTransport>, config: &SwitchboardConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                by_match: RwLock::new(HashMap::new()),
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

    /// Cancel the sweep task and drop live registrations. Idempotent.
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

        self.inner.by_match.write().await.clear();
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .gc_task
            .lock()
            .expect("gc task lock poisoned")
            .is_some()
    }

    /// Register a modal executor under its declared match keys.
    pub async fn register(
        &self,
        executor: Arc<dyn ModalExecutor>,
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
        let entry = Arc::new(ModalEntry::new(
            matches.clone(),
            None,
            executor,
            registration,
        ));

        let mut by_match = self.inner.by_match.write().await;
        for id_match in &matches {
            if by_match.contains_key(id_match) || self.inner.static_exact.contains_key(id_match) {
                return Err(RegistryError::Conflict {
                    custom_id: id_match.clone(),
                });
            }
        }
        for id_match in &matches {
            by_match.insert(id_match.clone(), entry.clone());
        }

        Ok(RegistrationRef {
            matches,
            message_id: None,
        })
    }

    /// Remove the registration answering to `id_match`.
    pub async fn deregister(&self, id_match: &str) -> Result<(), RegistryError> {
        let mut by_match = self.inner.by_match.write().await;
        let entry = by_match
            .get(id_match)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                key: id_match.to_owned(),
            })?;
        remove_entry(&mut by_match, &entry);
        Ok(())
    }

    /// Register a constant modal route with no expiry.
    pub async fn register_static(
        &self,
        custom_id: impl Into<String>,
        executor: Arc<dyn ModalExecutor>,
        prefix_match: bool,
    ) -> Result<(), RegistryError> {
        let custom_id = custom_id.into();
        custom_id::validate_match(&custom_id)?;

        let by_match = self.inner.by_match.read().await;
        if by_match.contains_key(&custom_id)
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

    /// Remove a constant modal route.
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

    pub async fn contains(&self, id_match: &str) -> bool {
        self.inner.by_match.read().await.contains_key(id_match)
            || self.inner.static_exact.contains_key(id_match)
    }

    /// Dispatch a gateway-delivered modal submission.
    pub async fn dispatch(&self, event: ModalInteractionEvent) -> DispatchOutcome {
        let (id_match, id_metadata) = split_owned(&event.custom_id);

        if let Some(executor) = self.find_static(&id_match) {
            let ctx = self.context(event, id_match, id_metadata, None);
            execute_static(&*executor, ctx).await;
            return DispatchOutcome::Dispatched;
        }

        let Some(entry) = self.resolve(&id_match).await else {
            self.send_expired_notice(&event).await;
            return DispatchOutcome::ExpiredOrUnknown;
        };

        let ctx = self.context(event, id_match, id_metadata, None);
        self.invoke(entry, ctx).await;
        DispatchOutcome::Dispatched
    }

    /// Dispatch an HTTP-delivered modal submission and resolve the payload
    /// the HTTP response should carry.
    pub async fn dispatch_rest(&self, event: ModalInteractionEvent) -> InteractionResponse {
        let (id_match, id_metadata) = split_owned(&event.custom_id);

        if let Some(executor) = self.find_static(&id_match) {
            let (tx, rx) = oneshot::channel();
            let ctx = self.context(event, id_match, id_metadata, Some(tx));
            tokio::spawn(async move { execute_static(&*executor, ctx).await });
            return self.await_response(rx).await;
        }

        let Some(entry) = self.resolve(&id_match).await else {
            return InteractionResponse::expired_notice();
        };

        let (tx, rx) = oneshot::channel();
        let ctx = self.context(event, id_match, id_metadata, Some(tx));
        let registry = self.clone();
        tokio::spawn(async move { registry.invoke(entry, ctx).await });
        self.await_response(rx).await
    }

    fn find_static(&self, id_match: &str) -> Option<Arc<dyn ModalExecutor>> {
        if let Some(executor) = self.inner.static_exact.get(id_match) {
            return Some(executor.clone());
        }
        self.inner
            .static_prefix
            .iter()
            .find(|entry| id_match.starts_with(entry.key().as_str()))
            .map(|entry| entry.value().clone())
    }

    async fn resolve(&self, id_match: &str) -> Option<Arc<ModalEntry>> {
        let now = Instant::now();
        let mut by_match = self.inner.by_match.write().await;
        let entry = by_match.get(id_match).cloned()?;

        {
            let mut state = entry.state.lock().expect("registration lock poisoned");
            if state.is_expired(now) {
                remove_entry(&mut by_match, &entry);
                return None;
            }
            state.on_use(now);
            if state.is_depleted() {
                remove_entry(&mut by_match, &entry);
            }
        }

        Some(entry)
    }

    async fn invoke(&self, entry: Arc<ModalEntry>, ctx: ModalContext) {
        match entry.executor.execute(ctx).await {
            Ok(()) => {}
            Err(ExecutorError::Closed) => {
                debug!("modal executor requested closure");
                remove_entry(&mut *self.inner.by_match.write().await, &entry);
            }
            Err(error) => error!(error = %error, "modal executor failed"),
        }
    }

    fn context(
        &self,
        event: ModalInteractionEvent,
        id_match: String,
        id_metadata: Option<String>,
        response_tx: Option<oneshot::Sender<InteractionResponse>>,
    ) -> ModalContext {
        let responder = Responder::new(
            Some(self.inner.transport.clone()),
            response_tx,
            event.interaction_id,
            event.application_id,
            event.token.clone(),
        );
        ModalContext::new(event, id_match, id_metadata, responder)
    }

    async fn send_expired_notice(&self, event: &ModalInteractionEvent) {
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
            error!(error = %error, "failed to send expired-modal notice");
        }
    }

    async fn await_response(
        &self,
        rx: oneshot::Receiver<InteractionResponse>,
    ) -> InteractionResponse {
        match tokio::time::timeout(self.inner.response_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) | Err(_) => {
                warn!("modal executor produced no initial response within the REST deadline");
                InteractionResponse::new(ResponseKind::DeferredMessageUpdate, None)
            }
        }
    }
}

fn split_owned(custom_id: &str) -> (String, Option<String>) {
    let (id_match, id_metadata) = custom_id::split(custom_id);
    (id_match.to_owned(), id_metadata.map(str::to_owned))
}

fn remove_entry(by_match: &mut HashMap<String, Arc<ModalEntry>>, entry: &Arc<ModalEntry>) {
    for id_match in &entry.matches {
        if by_match
            .get(id_match)
            .is_some_and(|existing| Arc::ptr_eq(existing, entry))
        {
            by_match.remove(id_match);
        }
    }
}

async fn execute_static(executor: &dyn ModalExecutor, ctx: ModalContext) {
    match executor.execute(ctx).await {
        Ok(()) => {}
        Err(ExecutorError::Closed) => {
            warn!("static modal executor signalled closure; static routes never expire")
        }
        Err(error) => error!(error = %error, "static modal executor failed"),
    }
}

async fn sweep(inner: &Arc<Inner>) {
    let now = Instant::now();
    let mut by_match = inner.by_match.write().await;

    let mut expired: Vec<Arc<ModalEntry>> = Vec::new();
    for entry in by_match.values() {
        if entry.is_expired(now) && !expired.iter().any(|seen| Arc::ptr_eq(seen, entry)) {
            expired.push(entry.clone());
        }
    }

    if expired.is_empty() {
        return;
    }

    let evicted = expired.len();
    for entry in expired {
        remove_entry(&mut by_match, &entry);
    }
    debug!(evicted, "sweep evicted expired modal registrations");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Modal, TextField};
    use crate::ids::{ApplicationId, InteractionId, UserId};
    use crate::platform::{FieldStyle, SubmittedField};
    use crate::testing::RecordingTransport;
    use crate::timeout::Timeout;
    use std::sync::Mutex;

    async fn noop(_ctx: ModalContext) -> Result<(), ExecutorError> {
        Ok(())
    }

    async fn ack(mut ctx: ModalContext) -> Result<(), ExecutorError> {
        ctx.acknowledge_update().await?;
        Ok(())
    }

    fn event(custom_id: &str, fields: Vec<SubmittedField>) -> ModalInteractionEvent {
        ModalInteractionEvent {
            interaction_id: InteractionId(1),
            application_id: ApplicationId(2),
            token: "token".into(),
            custom_id: custom_id.into(),
            message_id: None,
            channel_id: None,
            guild_id: None,
            author_id: UserId(42),
            fields,
        }
    }

    #[tokio::test]
    async fn test_submitted_values_reach_the_callback_by_field_id() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ModalRegistry::new(transport.clone());
        let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let seen_in_callback = seen.clone();

        let modal = Modal::new("report", "Report", move |mut ctx: ModalContext| {
            let seen = seen_in_callback.clone();
            async move {
                *seen.lock().unwrap() = ctx.field("reason").map(str::to_owned);
                ctx.respond_ephemeral("thanks").await?;
                Ok::<(), ExecutorError>(())
            }
        })
        .unwrap()
        .add_field(TextField::new("reason", "Reason", FieldStyle::Paragraph))
        .unwrap();

        registry
            .register(Arc::new(modal), RegisterOptions::new())
            .await
            .unwrap();

        let outcome = registry
            .dispatch(event(
                "report:m77",
                vec![SubmittedField {
                    custom_id: "reason".into(),
                    value: "spam".into(),
                }],
            ))
            .await;

        assert_eq!(outcome, DispatchOutcome::Dispatched);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("spam"));
        assert_eq!(transport.last_created_content().as_deref(), Some("thanks"));
    }

    #[tokio::test]
    async fn test_conflict_and_not_found() {
        let registry = ModalRegistry::new(Arc::new(RecordingTransport::default()));

        registry
            .register(
                Arc::new(Modal::new("form", "Form", noop).unwrap()),
                RegisterOptions::new(),
            )
            .await
            .unwrap();
        assert!(matches!(
            registry
                .register(
                    Arc::new(Modal::new("form", "Form", noop).unwrap()),
                    RegisterOptions::new(),
                )
                .await,
            Err(RegistryError::Conflict { .. })
        ));

        registry.deregister("form").await.unwrap();
        assert!(matches!(
            registry.deregister("form").await,
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_modal_gets_ephemeral_notice() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ModalRegistry::new(transport.clone());

        let outcome = registry.dispatch(event("ghost", Vec::new())).await;
        assert_eq!(outcome, DispatchOutcome::ExpiredOrUnknown);
        assert_eq!(
            transport.last_created_content().as_deref(),
            Some("This is no longer available.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_timeout_expires_despite_use() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ModalRegistry::new(transport);

        registry
            .register(
                Arc::new(Modal::new("brief", "Brief", ack).unwrap()),
                RegisterOptions::new().timeout(Timeout::Fixed(Duration::from_secs(10))),
            )
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(
            registry.dispatch(event("brief", Vec::new())).await,
            DispatchOutcome::Dispatched
        );

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(
            registry.dispatch(event("brief", Vec::new())).await,
            DispatchOutcome::ExpiredOrUnknown
        );
    }
}
