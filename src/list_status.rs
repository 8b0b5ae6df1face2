//! # Bot-List Status Reporting
//!
//! Periodically reports the bot's guild count to third-party bot-list
//! services. A [`CountStrategy`] supplies the count (typically maintained
//! from gateway guild events), [`BotListService`] implementations know how
//! each service wants the payload shaped, and the [`ServiceManager`] owns
//! one repeating task per added service, retrying failed posts with
//! [`Backoff`] and honouring `Retry-After`.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::ids::{ApplicationId, GuildId};
use crate::resilience::Backoff;

/// The bot's guild count, either global or broken down per shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildCount {
    Total(u64),
    Sharded(BTreeMap<u32, u64>),
}

impl GuildCount {
    /// The global count regardless of representation.
    pub fn total(&self) -> u64 {
        match self {
            Self::Total(count) => *count,
            Self::Sharded(shards) => shards.values().sum(),
        }
    }
}

/// Failure to produce a guild count.
#[derive(Debug, Error)]
pub enum CountError {
    /// No data yet, e.g. before the first shard became ready.
    #[error("guild count is currently unknown")]
    Unknown,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Strategy producing the current guild count.
#[async_trait]
pub trait CountStrategy: Send + Sync {
    async fn count(&self) -> Result<GuildCount, CountError>;
}

/// Count maintained from gateway guild events.
///
/// Feed it `shard_ready` / `guild_available` / `guild_left` calls from the
/// host's event loop; it answers with a per-shard breakdown.
#[derive(Default)]
pub struct EventCountStrategy {
    shards: RwLock<BTreeMap<u32, HashSet<GuildId>>>,
}

impl EventCountStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a shard's guild set from its ready payload.
    pub fn shard_ready(&self, shard_id: u32, guilds: impl IntoIterator<Item = GuildId>) {
        let mut shards = self.shards.write().expect("count lock poisoned");
        shards.insert(shard_id, guilds.into_iter().collect());
    }

    pub fn guild_available(&self, shard_id: u32, guild_id: GuildId) {
        let mut shards = self.shards.write().expect("count lock poisoned");
        shards.entry(shard_id).or_default().insert(guild_id);
    }

    pub fn guild_left(&self, shard_id: u32, guild_id: GuildId) {
        let mut shards = self.shards.write().expect("count lock poisoned");
        if let Some(guilds) = shards.get_mut(&shard_id) {
            guilds.remove(&guild_id);
        }
    }
}

#[async_trait]
impl CountStrategy for EventCountStrategy {
    async fn count(&self) -> Result<GuildCount, CountError> {
        let shards = self.shards.read().expect("count lock poisoned");
        if shards.is_empty() {
            return Err(CountError::Unknown);
        }
        Ok(GuildCount::Sharded(
            shards
                .iter()
                .map(|(shard_id, guilds)| (*shard_id, guilds.len() as u64))
                .collect(),
        ))
    }
}

/// Fixed count, for single-process bots that track it elsewhere.
pub struct FixedCountStrategy(pub u64);

#[async_trait]
impl CountStrategy for FixedCountStrategy {
    async fn count(&self) -> Result<GuildCount, CountError> {
        Ok(GuildCount::Total(self.0))
    }
}

/// Identity of the reporting bot.
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub bot_id: ApplicationId,
    pub shard_count: Option<u32>,
}

/// Failure to post a count to one service.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("service rate limited the report")]
    RateLimited { retry_after: Option<Duration> },

    #[error(transparent)]
    Http(#[from] anyhow::Error),
}

/// One bot-list service endpoint.
#[async_trait]
pub trait BotListService: Send + Sync {
    fn name(&self) -> &'static str;

    async fn report(
        &self,
        http: &reqwest::Client,
        info: &BotInfo,
        counts: &GuildCount,
    ) -> Result<(), ReportError>;
}

async fn post_stats(
    http: &reqwest::Client,
    url: &str,
    token: &str,
    payload: &Value,
) -> Result<(), ReportError> {
    let response = http
        .post(url)
        .header(AUTHORIZATION, token)
        .json(payload)
        .send()
        .await
        .map_err(|error| ReportError::Http(error.into()))?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ReportError::RateLimited { retry_after });
    }
    if !status.is_success() {
        return Err(ReportError::Http(anyhow::anyhow!(
            "{url} returned {status}"
        )));
    }
    Ok(())
}

/// <https://top.gg> status update service.
pub struct TopGgService {
    token: String,
}

impl TopGgService {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn payload(info: &BotInfo, counts: &GuildCount) -> Value {
        let mut payload = match counts {
            GuildCount::Total(count) => json!({ "server_count": count }),
            GuildCount::Sharded(shards) => {
                let shard_count = info.shard_count.unwrap_or_else(|| {
                    shards.keys().last().map_or(0, |highest| highest + 1)
                });
                let counts: Vec<u64> = (0..shard_count)
                    .map(|shard_id| shards.get(&shard_id).copied().unwrap_or(0))
                    .collect();
                json!({ "shards": counts })
            }
        };
        if let Some(shard_count) = info.shard_count {
            payload["shard_count"] = json!(shard_count);
        }
        payload
    }
}

#[async_trait]
impl BotListService for TopGgService {
    fn name(&self) -> &'static str {
        "Top.GG"
    }

    async fn report(
        &self,
        http: &reqwest::Client,
        info: &BotInfo,
        counts: &GuildCount,
    ) -> Result<(), ReportError> {
        let url = format!("https://top.gg/api/bots/{}/stats", info.bot_id);
        post_stats(http, &url, &self.token, &Self::payload(info, counts)).await
    }
}

/// <https://discord.bots.gg> status update service.
pub struct BotsGgService {
    token: String,
}

impl BotsGgService {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn payload(info: &BotInfo, counts: &GuildCount) -> Value {
        let mut payload = match counts {
            GuildCount::Total(count) => json!({ "guildCount": count }),
            GuildCount::Sharded(shards) => {
                let entries: Vec<Value> = shards
                    .iter()
                    .map(|(shard_id, count)| json!({ "shardId": shard_id, "guildCount": count }))
                    .collect();
                json!({ "shards": entries })
            }
        };
        if let Some(shard_count) = info.shard_count {
            payload["shardCount"] = json!(shard_count);
        }
        payload
    }
}

#[async_trait]
impl BotListService for BotsGgService {
    fn name(&self) -> &'static str {
        "Bots.GG"
    }

    async fn report(
        &self,
        http: &reqwest::Client,
        info: &BotInfo,
        counts: &GuildCount,
    ) -> Result<(), ReportError> {
        let url = format!("https://discord.bots.gg/api/v1/bots/{}/stats", info.bot_id);
        post_stats(http, &url, &self.token, &Self::payload(info, counts)).await
    }
}

/// <https://discordbotlist.com> status update service.
pub struct DiscordBotListService {
    token: String,
}

impl DiscordBotListService {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn payloads(counts: &GuildCount) -> Vec<Value> {
        match counts {
            GuildCount::Total(count) => vec![json!({ "guilds": count })],
            GuildCount::Sharded(shards) => shards
                .iter()
                .map(|(shard_id, count)| json!({ "guilds": count, "shard_id": shard_id }))
                .collect(),
        }
    }
}

#[async_trait]
impl BotListService for DiscordBotListService {
    fn name(&self) -> &'static str {
        "DiscordBotList"
    }

    async fn report(
        &self,
        http: &reqwest::Client,
        info: &BotInfo,
        counts: &GuildCount,
    ) -> Result<(), ReportError> {
        let url = format!("https://discordbotlist.com/api/v1/bots/{}/stats", info.bot_id);
        for payload in Self::payloads(counts) {
            post_stats(http, &url, &self.token, &payload).await?;
        }
        Ok(())
    }
}

struct ServiceDescriptor {
    service: Arc<dyn BotListService>,
    interval: Duration,
}

struct ManagerInner {
    http: reqwest::Client,
    info: BotInfo,
    strategy: Arc<dyn CountStrategy>,
    services: StdMutex<Vec<ServiceDescriptor>>,
    tasks: StdMutex<Option<Vec<JoinHandle<()>>>>,
}

/// Default reporting interval when a service doesn't pick one.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(3600);

/// Owns one repeating reporting task per added service.
#[derive(Clone)]
pub struct ServiceManager {
    inner: Arc<ManagerInner>,
}

impl ServiceManager {
    pub fn new(info: BotInfo, strategy: Arc<dyn CountStrategy>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("switchboard-core-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            inner: Arc::new(ManagerInner {
                http,
                info,
                strategy,
                services: StdMutex::new(Vec::new()),
                tasks: StdMutex::new(None),
            }),
        }
    }

    /// Add a service reporting every `interval`. Takes effect on the next
    /// `open`.
    pub fn add_service(&self, service: Arc<dyn BotListService>, interval: Duration) -> &Self {
        self.inner
            .services
            .lock()
            .expect("services lock poisoned")
            .push(ServiceDescriptor { service, interval });
        self
    }

    /// Spawn the repeating reporting tasks. Idempotent.
    pub fn open(&self) {
        let mut tasks = self.inner.tasks.lock().expect("tasks lock poisoned");
        if tasks.is_some() {
            return;
        }

        let services = self.inner.services.lock().expect("services lock poisoned");
        let mut spawned = Vec::with_capacity(services.len());
        for descriptor in services.iter() {
            let inner = self.inner.clone();
            let service = descriptor.service.clone();
            let interval = descriptor.interval;
            spawned.push(tokio::spawn(async move {
                loop {
                    tokio::time::sleep(interval).await;
                    report_once(&inner, &*service).await;
                }
            }));
        }
        *tasks = Some(spawned);
    }

    /// Cancel the reporting tasks. Idempotent and awaitable.
    pub async fn close(&self) {
        let tasks = self
            .inner
            .tasks
            .lock()
            .expect("tasks lock poisoned")
            .take();
        if let Some(tasks) = tasks {
            for task in &tasks {
                task.abort();
            }
            for task in tasks {
                let _ = task.await;
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .tasks
            .lock()
            .expect("tasks lock poisoned")
            .is_some()
    }
}

/// Post one report, retrying transient failures with backoff.
async fn report_once(inner: &Arc<ManagerInner>, service: &dyn BotListService) {
    let counts = match inner.strategy.count().await {
        Ok(counts) => counts,
        Err(CountError::Unknown) => {
            warn!(service = service.name(), "guild count unknown, skipping report");
            return;
        }
        Err(error) => {
            error!(service = service.name(), error = %error, "count strategy failed");
            return;
        }
    };

    let mut backoff = Backoff::new().max_retries(3);
    loop {
        match service.report(&inner.http, &inner.info, &counts).await {
            Ok(()) => {
                info!(
                    service = service.name(),
                    guilds = counts.total(),
                    "posted guild count"
                );
                return;
            }
            Err(ReportError::RateLimited { retry_after }) => {
                warn!(service = service.name(), ?retry_after, "rate limited");
                backoff.set_next_backoff(retry_after);
            }
            Err(ReportError::Http(error)) => {
                warn!(service = service.name(), error = %error, "report failed");
            }
        }

        if backoff.backoff().await.is_none() {
            error!(service = service.name(), "giving up on report after retries");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(shard_count: Option<u32>) -> BotInfo {
        BotInfo {
            bot_id: ApplicationId(123),
            shard_count,
        }
    }

    #[tokio::test]
    async fn test_event_strategy_tracks_guilds_per_shard() {
        let strategy = EventCountStrategy::new();
        assert!(matches!(
            strategy.count().await,
            Err(CountError::Unknown)
        ));

        strategy.shard_ready(0, [GuildId(1), GuildId(2)]);
        strategy.guild_available(1, GuildId(3));
        strategy.guild_available(0, GuildId(2));
        strategy.guild_left(0, GuildId(1));

        let counts = strategy.count().await.unwrap();
        assert_eq!(
            counts,
            GuildCount::Sharded(BTreeMap::from([(0, 1), (1, 1)]))
        );
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_top_gg_payload_shapes() {
        let payload = TopGgService::payload(&info(Some(2)), &GuildCount::Total(7));
        assert_eq!(payload, json!({ "server_count": 7, "shard_count": 2 }));

        let payload = TopGgService::payload(
            &info(Some(3)),
            &GuildCount::Sharded(BTreeMap::from([(0, 4), (2, 6)])),
        );
        assert_eq!(
            payload,
            json!({ "shards": [4, 0, 6], "shard_count": 3 })
        );
    }

    #[test]
    fn test_bots_gg_payload_shapes() {
        let payload = BotsGgService::payload(&info(None), &GuildCount::Total(9));
        assert_eq!(payload, json!({ "guildCount": 9 }));

        let payload = BotsGgService::payload(
            &info(Some(2)),
            &GuildCount::Sharded(BTreeMap::from([(0, 1), (1, 2)])),
        );
        assert_eq!(
            payload,
            json!({
                "shards": [
                    { "shardId": 0, "guildCount": 1 },
                    { "shardId": 1, "guildCount": 2 },
                ],
                "shardCount": 2,
            })
        );
    }

    #[test]
    fn test_discord_bot_list_posts_per_shard() {
        let payloads =
            DiscordBotListService::payloads(&GuildCount::Sharded(BTreeMap::from([(0, 5), (1, 6)])));
        assert_eq!(
            payloads,
            vec![
                json!({ "guilds": 5, "shard_id": 0 }),
                json!({ "guilds": 6, "shard_id": 1 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_manager_open_close_idempotent() {
        let manager = ServiceManager::new(info(None), Arc::new(FixedCountStrategy(1)));
        manager.add_service(Arc::new(TopGgService::new("token")), Duration::from_secs(3600));

        manager.open();
        manager.open();
        assert!(manager.is_open());

        manager.close().await;
        manager.close().await;
        assert!(!manager.is_open());
    }
}
