//! Resolve addresses example
//!
//! This example demonstrates the core functionality of bulk-geocoder:
//! - Loading configuration (optionally from a JSON file)
//! - Creating a resolver instance
//! - Subscribing to progress events
//! - Resolving a batch of addresses
//! - Inspecting per-address outcomes
//!
//! Usage:
//!
//! ```bash
//! RUST_LOG=bulk_geocoder=debug cargo run --example resolve_addresses -- \
//!     "406 ANG MO KIO AVE 10" "108 ANG MO KIO AVE 4"
//! ```
//!
//! Set `GEOCODER_CONFIG=path/to/config.json` to override the defaults.

use bulk_geocoder::{BatchResolver, Config, Event};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::var("GEOCODER_CONFIG") {
        Ok(path) => Config::from_json_file(std::path::Path::new(&path))?,
        Err(_) => Config::default(),
    };

    let mut addresses: Vec<String> = std::env::args().skip(1).collect();
    if addresses.is_empty() {
        addresses = vec![
            "406 ANG MO KIO AVE 10".to_string(),
            "108 ANG MO KIO AVE 4".to_string(),
        ];
    }

    let resolver = BatchResolver::from_config(&config)?;

    let mut events = resolver.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::BatchStarted {
                    total,
                    concurrency_limit,
                } => {
                    println!("→ Resolving {} addresses ({} at a time)", total, concurrency_limit);
                }
                Event::QueryFailed { index, reason, .. } => {
                    println!("✗ #{} failed: {}", index, reason);
                }
                Event::BatchCompleted {
                    summary,
                    elapsed_ms,
                } => {
                    println!(
                        "✓ Done in {} ms: {} ok, {} failed ({} timed out)",
                        elapsed_ms, summary.succeeded, summary.failed, summary.timed_out
                    );
                }
                _ => {}
            }
        }
    });

    let results = resolver.resolve_addresses(&addresses).await?;

    for (address, outcome) in addresses.iter().zip(results.iter()) {
        match outcome.payload() {
            Some(payload) => println!("{}: {}", address, payload),
            None => println!("{}: <failed>", address),
        }
    }

    if results.failure_count() > 0 {
        println!(
            "Failed URLs were appended to {}",
            config.failure_log_path.display()
        );
    }

    Ok(())
}
