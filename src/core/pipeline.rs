//! Fetch-and-cache controller.
//!
//! One [`Controller`] run resolves one source to a displayable record:
//!
//! 1. **Init**: a cache entry younger than the TTL is served as is.
//! 2. **Fetching**: the primary chain is walked (primary, then at most one
//!    fallback). Optional sub-resources follow, each with its own chain.
//! 3. **Success**: overrides fill absent fields, the record is persisted and
//!    published.
//! 4. **Degraded**: any cached entry, however old, is served instead.
//! 5. **Failed**: nothing is available; an error message is published.
//!
//! A [`CancellationToken`] stands in for the consumer's liveness: it is
//! checked after every await, before the cache write and before every
//! publication. Once cancelled, nothing is written or published.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::fetch_plan::{EndpointChain, FetchAttempt, FetchOutcome};
use super::http::HttpClient;
use super::models::{AnyRecord, FillAbsent, Origin, Resolved};
use super::source::Source;
use crate::error::{Result, StatError};
use crate::sources::{self, CodeChef, LeetCode, SourceContext, StatSource, WakaTime};
use crate::storage::cache::{CacheEntry, KeyValueStore, read_entry, write_entry};
use crate::storage::config::SourceConfig;
use crate::util::time::{Clock, SystemClock};

// =============================================================================
// Rendering boundary
// =============================================================================

/// What a consumer should display.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState<R> {
    Loading,
    Error(String),
    Ready(R),
}

/// Receives state transitions from a controller run.
pub trait StateSink<R>: Send + Sync {
    fn publish(&self, state: WidgetState<R>);
}

/// Discards every state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl<R> StateSink<R> for NoopSink {
    fn publish(&self, _state: WidgetState<R>) {}
}

/// Logs state transitions at debug level.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    pub source: Source,
}

impl<R> StateSink<R> for TracingSink {
    fn publish(&self, state: WidgetState<R>) {
        match state {
            WidgetState::Loading => {
                tracing::debug!(source = %self.source, "Loading {} stats", self.source.stats_label());
            }
            WidgetState::Error(message) => {
                tracing::debug!(source = %self.source, %message, "Widget error");
            }
            WidgetState::Ready(_) => tracing::debug!(source = %self.source, "Widget ready"),
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Drives one source through cache, network and fallback.
pub struct Controller<S: StatSource> {
    source: S,
    store: Arc<dyn KeyValueStore>,
    client: HttpClient,
    overrides: S::Record,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    force_refresh: bool,
}

impl<S: StatSource> Controller<S> {
    /// Controller with the source's default overrides and TTL.
    #[must_use]
    pub fn new(source: S, store: Arc<dyn KeyValueStore>, client: HttpClient) -> Self {
        let overrides = source.default_overrides();
        let ttl = source.kind().default_ttl();
        Self {
            source,
            store,
            client,
            overrides,
            ttl,
            clock: Arc::new(SystemClock),
            force_refresh: false,
        }
    }

    /// Builder: replace the override set.
    #[must_use]
    pub fn with_overrides(mut self, overrides: S::Record) -> Self {
        self.overrides = overrides;
        self
    }

    /// Builder: freshness window.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builder: time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: skip the freshness check.
    #[must_use]
    pub const fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Cache key this controller reads and writes.
    #[must_use]
    pub fn key(&self) -> String {
        self.source.cache_key()
    }

    /// Run the state machine once.
    ///
    /// Never panics and never returns early through `?`: every failure ends
    /// up in the outcome's `result`.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        sink: &dyn StateSink<S::Record>,
    ) -> FetchOutcome<S::Record> {
        let key = self.key();
        let mut attempts = Vec::new();
        let result = self.resolve(cancel, sink, &key, &mut attempts).await;

        if let Err(StatError::Cancelled(_)) = &result {
            tracing::debug!(source = %self.source.kind(), "Run cancelled; results discarded");
        }

        FetchOutcome {
            source: self.source.kind(),
            key,
            result,
            attempts,
        }
    }

    async fn resolve(
        &self,
        cancel: &CancellationToken,
        sink: &dyn StateSink<S::Record>,
        key: &str,
        attempts: &mut Vec<FetchAttempt>,
    ) -> Result<Resolved<S::Record>> {
        let kind = self.source.kind();

        // Init
        if self.force_refresh {
            tracing::debug!(source = %kind, "Forced refresh; skipping freshness check");
        } else if let Some(entry) = read_entry::<S::Record>(self.store.as_ref(), key) {
            let now = self.clock.now_ms();
            if entry.is_fresh_at(now, self.ttl) {
                tracing::debug!(source = %kind, age_ms = entry.age_ms(now), "Serving fresh cache");
                self.publish(cancel, sink, WidgetState::Ready(entry.data.clone()))?;
                return Ok(Resolved {
                    record: entry.data,
                    origin: Origin::FreshCache,
                    fetched_at: entry.timestamp,
                });
            }
            tracing::debug!(source = %kind, age_ms = entry.age_ms(now), "Cache entry expired");
        }

        // Fetching
        self.publish(cancel, sink, WidgetState::Loading)?;

        match self.refresh(cancel, attempts).await {
            Ok(record) => {
                ensure_live(cancel, kind)?;
                let now = self.clock.now_ms();
                if let Err(e) = write_entry(self.store.as_ref(), key, &CacheEntry::new(&record, now))
                {
                    tracing::warn!(source = %kind, key, error = %e, "Failed to persist cache entry");
                }
                self.publish(cancel, sink, WidgetState::Ready(record.clone()))?;
                Ok(Resolved {
                    record,
                    origin: Origin::Network,
                    fetched_at: now,
                })
            }
            Err(e @ StatError::Cancelled(_)) => Err(e),
            Err(e) => self.degrade(cancel, sink, key, &e, attempts.len()),
        }
    }

    /// Primary chain, then sub-resources, then overrides.
    async fn refresh(
        &self,
        cancel: &CancellationToken,
        attempts: &mut Vec<FetchAttempt>,
    ) -> Result<S::Record> {
        let kind = self.source.kind();
        let primary = self.source.primary();
        let mut record = self
            .walk_chain(&primary, cancel, attempts, |payload| {
                self.source.normalize(payload)
            })
            .await?;

        for chain in self.source.sub_resources() {
            if chain.is_empty() {
                continue;
            }
            let resource = chain.resource;
            let outcome = self
                .walk_chain(&chain, cancel, attempts, |payload| {
                    let mut candidate = record.clone();
                    let changed = self
                        .source
                        .apply_sub_resource(&mut candidate, resource, payload)?;
                    Ok(changed.then_some(candidate))
                })
                .await;

            match outcome {
                Ok(Some(updated)) => {
                    tracing::debug!(source = %kind, resource, "Sub-resource applied");
                    record = updated;
                }
                Ok(None) => {
                    tracing::debug!(source = %kind, resource, "Sub-resource empty; keeping primary data");
                }
                Err(e @ StatError::Cancelled(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(source = %kind, resource, error = %e, "Sub-resource failed; keeping primary data");
                }
            }
        }

        record.fill_absent(&self.overrides);
        Ok(record)
    }

    /// Try each endpoint once, in order, until one yields a usable payload.
    async fn walk_chain<T>(
        &self,
        chain: &EndpointChain,
        cancel: &CancellationToken,
        attempts: &mut Vec<FetchAttempt>,
        mut interpret: impl FnMut(&Value) -> Result<T>,
    ) -> Result<T> {
        let kind = self.source.kind();
        let mut last_error = None;

        for endpoint in &chain.endpoints {
            ensure_live(cancel, kind)?;
            tracing::info!(
                source = %kind,
                resource = chain.resource,
                endpoint = endpoint.label,
                url = %endpoint.url,
                "Trying endpoint"
            );

            let started_at = Utc::now();
            let start = Instant::now();
            let fetched = self.client.fetch_json(&endpoint.url).await;
            ensure_live(cancel, kind)?;

            let result = fetched.and_then(|payload| interpret(&payload));
            let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            attempts.push(FetchAttempt {
                resource: chain.resource.to_string(),
                endpoint: endpoint.label.to_string(),
                url: endpoint.url.clone(),
                started_at,
                duration_ms,
                success: result.is_ok(),
                error: result.as_ref().err().map(ToString::to_string),
            });

            match result {
                Ok(value) => {
                    tracing::info!(
                        source = %kind,
                        resource = chain.resource,
                        endpoint = endpoint.label,
                        duration_ms,
                        "Endpoint succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(
                        source = %kind,
                        resource = chain.resource,
                        endpoint = endpoint.label,
                        error = %e,
                        "Endpoint failed"
                    );
                    if !e.is_fallback_eligible() {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            StatError::Config(format!(
                "no endpoints configured for {kind} {}",
                chain.resource
            ))
        }))
    }

    /// Refresh failed: serve any cached entry, else fail.
    fn degrade(
        &self,
        cancel: &CancellationToken,
        sink: &dyn StateSink<S::Record>,
        key: &str,
        cause: &StatError,
        attempt_count: usize,
    ) -> Result<Resolved<S::Record>> {
        let kind = self.source.kind();
        ensure_live(cancel, kind)?;

        if let Some(entry) = read_entry::<S::Record>(self.store.as_ref(), key) {
            tracing::warn!(
                source = %kind,
                error = %cause,
                age_ms = entry.age_ms(self.clock.now_ms()),
                "Refresh failed; serving stale cache"
            );
            self.publish(cancel, sink, WidgetState::Ready(entry.data.clone()))?;
            return Ok(Resolved {
                record: entry.data,
                origin: Origin::StaleCache,
                fetched_at: entry.timestamp,
            });
        }

        let failure = StatError::SourceUnavailable {
            display: kind.stats_label().to_string(),
            attempts: attempt_count,
        };
        tracing::warn!(source = %kind, error = %cause, "Refresh failed and nothing is cached");
        self.publish(cancel, sink, WidgetState::Error(failure.to_string()))?;
        Err(failure)
    }

    fn publish(
        &self,
        cancel: &CancellationToken,
        sink: &dyn StateSink<S::Record>,
        state: WidgetState<S::Record>,
    ) -> Result<()> {
        ensure_live(cancel, self.source.kind())?;
        sink.publish(state);
        Ok(())
    }
}

fn ensure_live(cancel: &CancellationToken, kind: Source) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(StatError::Cancelled(kind.cli_name().to_string()));
    }
    Ok(())
}

// =============================================================================
// Multi-source fan-out
// =============================================================================

/// Shared dependencies for a batch of controller runs.
#[derive(Clone)]
pub struct FetchContext {
    pub store: Arc<dyn KeyValueStore>,
    pub client: HttpClient,
    pub clock: Arc<dyn Clock>,
    pub force_refresh: bool,
    pub cancel: CancellationToken,
}

impl FetchContext {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, client: HttpClient) -> Self {
        Self {
            store,
            client,
            clock: Arc::new(SystemClock),
            force_refresh: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Builder: time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: skip freshness checks.
    #[must_use]
    pub const fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

fn failed<R>(source: Source, key: String, error: StatError) -> FetchOutcome<R> {
    FetchOutcome {
        source,
        key,
        result: Err(error),
        attempts: Vec::new(),
    }
}

async fn run_configured<S: StatSource>(
    source: S,
    settings: &SourceConfig,
    ctx: &FetchContext,
    wrap: fn(S::Record) -> AnyRecord,
) -> FetchOutcome<AnyRecord> {
    let kind = source.kind();
    let overrides = match sources::resolve_overrides(
        kind,
        settings.overrides.as_ref(),
        source.default_overrides(),
    ) {
        Ok(overrides) => overrides,
        Err(e) => return failed(kind, source.cache_key(), e),
    };

    let controller = Controller::new(source, ctx.store.clone(), ctx.client.clone())
        .with_overrides(overrides)
        .with_ttl(settings.ttl)
        .with_clock(ctx.clock.clone())
        .with_force_refresh(ctx.force_refresh);

    controller
        .run(&ctx.cancel, &TracingSink { source: kind })
        .await
        .map(wrap)
}

/// Build and run the controller for one configured source.
pub async fn fetch_source(
    source: Source,
    settings: &SourceConfig,
    ctx: &FetchContext,
) -> FetchOutcome<AnyRecord> {
    let Some(identity) = settings.identity.clone() else {
        return failed(
            source,
            String::new(),
            StatError::MissingIdentity(source.cli_name().to_string()),
        );
    };

    let source_ctx = SourceContext {
        identity,
        endpoints: settings.endpoints.clone(),
    };
    let key = source.cache_key(source_ctx.identity.trim());

    match source {
        Source::WakaTime => match WakaTime::new(source_ctx) {
            Ok(s) => run_configured(s, settings, ctx, AnyRecord::Activity).await,
            Err(e) => failed(source, key, e),
        },
        Source::CodeChef => match CodeChef::new(source_ctx) {
            Ok(s) => run_configured(s, settings, ctx, AnyRecord::Profile).await,
            Err(e) => failed(source, key, e),
        },
        Source::LeetCode => match LeetCode::new(source_ctx) {
            Ok(s) => run_configured(s, settings, ctx, AnyRecord::Profile).await,
            Err(e) => failed(source, key, e),
        },
    }
}

/// Run several sources concurrently. Runs share nothing but the store.
pub async fn fetch_sources(
    requests: &[(Source, SourceConfig)],
    ctx: &FetchContext,
) -> Vec<FetchOutcome<AnyRecord>> {
    let futures: Vec<_> = requests
        .iter()
        .map(|(source, settings)| fetch_source(*source, settings, ctx))
        .collect();

    futures::future::join_all(futures).await
}
