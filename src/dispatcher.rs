//! Batch dispatcher: resolve every query of a batch with bounded concurrency
//!
//! Queries are admitted in input order through a buffered stream holding at most
//! `concurrency_limit` fetches at once; the next query starts as soon as any
//! in-flight fetch finishes. Completions arrive unordered and are put back into
//! batch order by [`assemble`](crate::aggregator::assemble).
//!
//! A failed query is written to the failure sink before its outcome is handed to the
//! collector. Failures never cancel or delay other queries, and a sink that cannot
//! write only produces a warning.

use futures::stream::{self, StreamExt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use crate::aggregator::assemble;
use crate::config::Config;
use crate::error::Result;
use crate::query::QueryBuilder;
use crate::sink::{FailureSink, FileFailureSink};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Batch, Event, Outcome, Query, ResultSet};

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Resolves batches of queries through an injected transport and failure sink
///
/// # Example
///
/// ```no_run
/// use bulk_geocoder::{BatchResolver, Config};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = BatchResolver::from_config(&Config::default())?;
///
/// let results = resolver
///     .resolve_addresses(["406 ANG MO KIO AVE 10", "108 ANG MO KIO AVE 4"])
///     .await?;
///
/// for outcome in &results {
///     match outcome.payload() {
///         Some(payload) => println!("found: {}", payload["found"]),
///         None => println!("failed: {:?}", outcome.failure_reason()),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct BatchResolver {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn FailureSink>,
    event_tx: broadcast::Sender<Event>,
    /// Used by `resolve_addresses` to turn addresses into queries
    query_builder: QueryBuilder,
    /// Limits applied to batches built by `resolve_addresses`
    concurrency_limit: NonZeroUsize,
    request_timeout: Duration,
}

impl BatchResolver {
    /// Create a resolver from an explicit transport and failure sink
    ///
    /// Address-level defaults (query builder, concurrency limit, timeout) come from
    /// [`Config::default`]; batches passed to [`resolve`](Self::resolve) carry their
    /// own limits.
    pub fn new(transport: Arc<dyn Transport>, sink: Arc<dyn FailureSink>) -> Self {
        let defaults = Config::default();
        let (event_tx, _rx) = broadcast::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);

        Self {
            transport,
            sink,
            event_tx,
            query_builder: QueryBuilder::from_config(&defaults),
            concurrency_limit: NonZeroUsize::new(defaults.concurrency_limit)
                .unwrap_or(NonZeroUsize::MIN),
            request_timeout: defaults.request_timeout,
        }
    }

    /// Create a resolver that fetches over HTTP and logs failures to the configured file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let transport = Arc::new(HttpTransport::from_config(config)?);
        let sink = Arc::new(FileFailureSink::new(&config.failure_log_path));
        Self::with_config(transport, sink, config)
    }

    /// Create a resolver from explicit components, taking defaults from `config`
    pub fn with_config(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn FailureSink>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = broadcast::channel(config.event_channel_capacity);
        let concurrency_limit = NonZeroUsize::new(config.concurrency_limit)
            .ok_or_else(|| {
                crate::Error::config("concurrency_limit", "concurrency_limit must be at least 1")
            })?;

        Ok(Self {
            transport,
            sink,
            event_tx,
            query_builder: QueryBuilder::from_config(config),
            concurrency_limit,
            request_timeout: config.request_timeout,
        })
    }

    /// Subscribe to progress events
    ///
    /// Only events sent after subscribing are received. Slow receivers may lag and
    /// miss events; resolution itself never waits for subscribers.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Resolve every query in `batch`
    ///
    /// Returns once every query has an outcome. The result has exactly one outcome per
    /// query, at the same position as the query in the batch. Per-query failures are
    /// reported inside the result set, not as errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aggregation`](crate::Error::Aggregation) only if outcomes cannot
    /// be matched back to their queries, which indicates a bug rather than a network
    /// problem.
    pub async fn resolve(&self, batch: Batch) -> Result<ResultSet> {
        let total = batch.len();
        if total == 0 {
            tracing::debug!("empty batch, nothing to resolve");
            return Ok(ResultSet::default());
        }

        let concurrency_limit = batch.concurrency_limit().get();
        let request_timeout = batch.request_timeout();

        tracing::info!(
            total,
            concurrency_limit,
            timeout_ms = u64::try_from(request_timeout.as_millis()).unwrap_or(u64::MAX),
            transport = self.transport.name(),
            "resolving batch"
        );
        self.event_tx
            .send(Event::BatchStarted {
                total,
                concurrency_limit,
            })
            .ok();

        let started = Instant::now();

        let outcomes: Vec<(usize, Outcome)> =
            stream::iter(batch.into_queries().into_iter().enumerate())
                .map(|(index, url)| async move {
                    let outcome = self.resolve_one(index, &url, request_timeout).await;
                    (index, outcome)
                })
                .buffer_unordered(concurrency_limit)
                .collect()
                .await;

        let results = assemble(total, outcomes)?;
        let summary = results.summary();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            timed_out = summary.timed_out,
            elapsed_ms,
            "batch resolved"
        );
        self.event_tx
            .send(Event::BatchCompleted {
                summary,
                elapsed_ms,
            })
            .ok();

        Ok(results)
    }

    /// Build queries for `addresses` and resolve them with the resolver's default limits
    pub async fn resolve_addresses<I, S>(&self, addresses: I) -> Result<ResultSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries = self.query_builder.build_all(addresses);
        let batch = Batch::new(queries, self.concurrency_limit, self.request_timeout);
        self.resolve(batch).await
    }

    /// Fetch one query and, on failure, record it before returning the outcome
    async fn resolve_one(&self, index: usize, url: &Query, timeout: Duration) -> Outcome {
        let outcome = self.transport.fetch(url, timeout).await;

        match &outcome {
            Outcome::Success(_) => {
                tracing::debug!(index, url = %url, "query resolved");
                self.event_tx
                    .send(Event::QueryResolved {
                        index,
                        url: url.clone(),
                    })
                    .ok();
            }
            Outcome::Failure(reason) => {
                if let Err(e) = self.sink.record(url).await {
                    tracing::warn!(
                        index,
                        url = %url,
                        error = %e,
                        "failed to record failed query, continuing batch"
                    );
                }
                tracing::debug!(index, url = %url, reason = reason.code(), "query failed");
                self.event_tx
                    .send(Event::QueryFailed {
                        index,
                        url: url.clone(),
                        reason: reason.clone(),
                    })
                    .ok();
            }
        }

        outcome
    }
}

impl std::fmt::Debug for BatchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchResolver")
            .field("transport", &self.transport.name())
            .field("query_builder", &self.query_builder)
            .field("concurrency_limit", &self.concurrency_limit)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
