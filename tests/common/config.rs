//! Test configuration helpers for pointing a resolver at a mock geocoder

use bulk_geocoder::{BatchResolver, Config, QueryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Path component the mock geocoder serves searches on
pub const SEARCH_PATH: &str = "/commonapi/search";

/// Build a config whose queries hit `server` and whose failure log lives in `dir`
pub fn mock_config(server: &MockServer, dir: &Path, concurrency_limit: usize) -> Config {
    Config {
        concurrency_limit,
        request_timeout: Duration::from_millis(300),
        failure_log_path: dir.join("failed_requests.csv"),
        query: QueryConfig {
            prefix: format!("{}{}?searchVal=", server.uri(), SEARCH_PATH),
            suffix: "&returnGeom=Y&getAddrDetails=Y&pageNum=1".to_string(),
        },
        ..Default::default()
    }
}

/// Create a production resolver (HTTP transport + file sink) against a mock geocoder
///
/// Returns the resolver, the failure log path, and the temp dir guard.
pub fn create_test_resolver(
    server: &MockServer,
    concurrency_limit: usize,
) -> (BatchResolver, PathBuf, TempDir) {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = mock_config(server, temp_dir.path(), concurrency_limit);
    let resolver = BatchResolver::from_config(&config).expect("failed to build resolver");
    (resolver, config.failure_log_path, temp_dir)
}

/// Read the failure log, returning the URL column of each line
///
/// A missing file counts as an empty log.
pub fn failure_log_urls(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(|line| {
                line.rsplit_once(',')
                    .map(|(url, _timestamp)| url.to_string())
                    .expect("failure log line without timestamp")
            })
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => panic!("failed to read failure log: {e}"),
    }
}
