//! Mock geocoder responses

use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::SEARCH_PATH;

/// Search response shaped like the OneMap search API
pub fn search_response(address: &str, lat: &str, lon: &str) -> Value {
    json!({
        "found": 1,
        "totalNumPages": 1,
        "pageNum": 1,
        "results": [{
            "SEARCHVAL": address,
            "ADDRESS": format!("{address} SINGAPORE"),
            "LATITUDE": lat,
            "LONGITUDE": lon,
        }]
    })
}

/// Answer `address` immediately with a search result
pub async fn mount_found(server: &MockServer, address: &str, lat: &str, lon: &str) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("searchVal", address))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response(address, lat, lon)))
        .mount(server)
        .await;
}

/// Answer `address` only after `delay`
pub async fn mount_slow(server: &MockServer, address: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("searchVal", address))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_response(address, "0", "0"))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Answer `address` with a bare status code
pub async fn mount_status(server: &MockServer, address: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("searchVal", address))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answer `address` with a 200 whose body is not JSON
pub async fn mount_garbled(server: &MockServer, address: &str) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("searchVal", address))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(server)
        .await;
}

/// Answer every search with an empty result
pub async fn mount_any_empty(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"found": 0, "totalNumPages": 0, "pageNum": 1, "results": []}))
                .set_delay(Duration::from_millis(5)),
        )
        .mount(server)
        .await;
}
