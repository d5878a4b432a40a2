//! Core types for bulk-geocoder

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, FailureReason, Result};

/// A fully built request URL
///
/// Immutable once constructed and cheap to clone. Two queries with the same string
/// are equal, but a batch may still contain both; each is fetched independently.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(Arc<str>);

impl Query {
    /// Create a new Query from a URL string
    pub fn new(url: impl Into<Arc<str>>) -> Self {
        Self(url.into())
    }

    /// Get the URL as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Query {
    fn from(url: String) -> Self {
        Self(url.into())
    }
}

impl From<&str> for Query {
    fn from(url: &str) -> Self {
        Self(url.into())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of resolving a single query
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The decoded response body, left unparsed beyond generic JSON
    Success(serde_json::Value),
    /// The query failed; the reason is terminal for this query
    Failure(FailureReason),
}

impl Outcome {
    /// Returns true for [`Outcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns true for [`Outcome::Failure`]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// The decoded payload, if the query succeeded
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Outcome::Success(payload) => Some(payload),
            Outcome::Failure(_) => None,
        }
    }

    /// The failure reason, if the query failed
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> std::result::Result<serde_json::Value, FailureReason> {
        match self {
            Outcome::Success(payload) => Ok(payload),
            Outcome::Failure(reason) => Err(reason),
        }
    }
}

impl From<std::result::Result<serde_json::Value, FailureReason>> for Outcome {
    fn from(result: std::result::Result<serde_json::Value, FailureReason>) -> Self {
        match result {
            Ok(payload) => Outcome::Success(payload),
            Err(reason) => Outcome::Failure(reason),
        }
    }
}

/// An ordered set of queries to resolve in one call
///
/// The concurrency limit is non-zero by construction.
#[derive(Clone, Debug)]
pub struct Batch {
    queries: Vec<Query>,
    concurrency_limit: NonZeroUsize,
    request_timeout: Duration,
}

impl Batch {
    /// Create a batch with an explicit concurrency limit and per-request timeout
    pub fn new(
        queries: Vec<Query>,
        concurrency_limit: NonZeroUsize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            queries,
            concurrency_limit,
            request_timeout,
        }
    }

    /// Create a batch using the limits from a configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `concurrency_limit` is zero.
    pub fn from_config(queries: Vec<Query>, config: &Config) -> Result<Self> {
        let concurrency_limit = NonZeroUsize::new(config.concurrency_limit).ok_or_else(|| {
            Error::config("concurrency_limit", "concurrency_limit must be at least 1")
        })?;
        Ok(Self::new(queries, concurrency_limit, config.request_timeout))
    }

    /// The queries in submission order
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Maximum number of requests in flight at once
    pub fn concurrency_limit(&self) -> NonZeroUsize {
        self.concurrency_limit
    }

    /// Deadline for each individual request
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Number of queries in the batch
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Returns true if the batch has no queries
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub(crate) fn into_queries(self) -> Vec<Query> {
        self.queries
    }
}

/// Outcomes of a batch, in the same order as the batch's queries
///
/// Position `i` answers query `i` of the originating [`Batch`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<Outcome>);

impl ResultSet {
    pub(crate) fn from_ordered(outcomes: Vec<Outcome>) -> Self {
        Self(outcomes)
    }

    /// Number of outcomes (always equal to the batch length)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the originating batch was empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The outcome for the query at `index`
    pub fn get(&self, index: usize) -> Option<&Outcome> {
        self.0.get(index)
    }

    /// Iterate over outcomes in batch order
    pub fn iter(&self) -> std::slice::Iter<'_, Outcome> {
        self.0.iter()
    }

    /// Consume the set, returning the outcomes in batch order
    pub fn into_vec(self) -> Vec<Outcome> {
        self.0
    }

    /// Number of successful queries
    pub fn success_count(&self) -> usize {
        self.0.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed queries
    pub fn failure_count(&self) -> usize {
        self.0.iter().filter(|o| o.is_failure()).count()
    }

    /// Batch positions and reasons of every failed query
    pub fn failures(&self) -> impl Iterator<Item = (usize, &FailureReason)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.failure_reason().map(|r| (i, r)))
    }

    /// Aggregate counts for reporting
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.0.len(),
            ..Default::default()
        };
        for outcome in &self.0 {
            match outcome {
                Outcome::Success(_) => summary.succeeded += 1,
                Outcome::Failure(reason) => {
                    summary.failed += 1;
                    if reason.is_timeout() {
                        summary.timed_out += 1;
                    }
                }
            }
        }
        summary
    }
}

impl IntoIterator for ResultSet {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Outcome;
    type IntoIter = std::slice::Iter<'a, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Counts describing how a batch went
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of queries in the batch
    pub total: usize,
    /// Queries that returned a decoded payload
    pub succeeded: usize,
    /// Queries that failed for any reason
    pub failed: usize,
    /// Subset of `failed` that hit the request timeout
    pub timed_out: usize,
}

/// A failed URL as written to the failure log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// The URL that failed
    pub url: Query,
    /// When the failure was recorded
    pub timestamp: DateTime<Utc>,
}

impl FailureRecord {
    /// Create a record stamped with the current time
    pub fn now(url: Query) -> Self {
        Self {
            url,
            timestamp: Utc::now(),
        }
    }

    /// Render as one CSV line (without trailing newline): `url,timestamp`
    ///
    /// The URL is quoted if it contains a comma, quote or line break.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{}",
            csv_field(self.url.as_str()),
            self.timestamp.to_rfc3339()
        )
    }
}

fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        std::borrow::Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        std::borrow::Cow::Borrowed(value)
    }
}

/// Progress events emitted by the resolver
///
/// Consumers subscribe via [`BatchResolver::subscribe`](crate::BatchResolver::subscribe).
/// Nothing is buffered for late subscribers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A non-empty batch was accepted
    BatchStarted {
        /// Number of queries in the batch
        total: usize,
        /// Maximum requests in flight
        concurrency_limit: usize,
    },

    /// A query resolved successfully
    QueryResolved {
        /// Position of the query in the batch
        index: usize,
        /// The query URL
        url: Query,
    },

    /// A query failed (recording in the failure sink was attempted first)
    QueryFailed {
        /// Position of the query in the batch
        index: usize,
        /// The query URL
        url: Query,
        /// Why it failed
        reason: FailureReason,
    },

    /// Every query in the batch has an outcome
    BatchCompleted {
        /// Final counts
        summary: BatchSummary,
        /// Wall-clock duration of the batch
        elapsed_ms: u64,
    },
}
