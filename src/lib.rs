//! # bulk-geocoder
//!
//! Resolve large batches of free-text addresses against an unreliable geocoding API.
//!
//! ## Design Philosophy
//!
//! bulk-geocoder is designed to be:
//! - **Bounded** - At most `concurrency_limit` requests are in flight, whatever the batch size
//! - **Fault-tolerant** - A hung or failing request costs one query, never the batch
//! - **Order-preserving** - Result `i` always answers query `i`
//! - **Library-first** - Downloading datasets and writing output files is left to the caller
//!
//! ## Quick Start
//!
//! ```no_run
//! use bulk_geocoder::{BatchResolver, Config};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         concurrency_limit: 20,
//!         request_timeout: Duration::from_secs(2),
//!         failure_log_path: "data/failed_requests.csv".into(),
//!         ..Default::default()
//!     };
//!
//!     let resolver = BatchResolver::from_config(&config)?;
//!
//!     // Subscribe to progress events
//!     let mut events = resolver.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let results = resolver
//!         .resolve_addresses(["406 ANG MO KIO AVE 10", "108 ANG MO KIO AVE 4"])
//!         .await?;
//!     println!("{:?}", results.summary());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Restoring batch order from unordered completions
pub mod aggregator;
/// Configuration types
pub mod config;
/// Bounded-concurrency batch resolution
pub mod dispatcher;
/// Error types
pub mod error;
/// Request URL construction
pub mod query;
/// Append-only failure logging
pub mod sink;
/// Single-request HTTP transport
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use aggregator::assemble;
pub use config::{Config, QueryConfig};
pub use dispatcher::BatchResolver;
pub use error::{Error, FailureReason, Result};
pub use query::QueryBuilder;
pub use sink::{FailureSink, FileFailureSink, MemoryFailureSink};
pub use transport::{HttpTransport, Transport};
pub use types::{Batch, BatchSummary, Event, FailureRecord, Outcome, Query, ResultSet};
