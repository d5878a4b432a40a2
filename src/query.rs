//! Request URL construction
//!
//! Addresses are spliced between a fixed prefix and suffix without any validation
//! or encoding. Malformed addresses simply produce whatever URL results; the
//! provider's answer (or the HTTP client's refusal) surfaces later as a failed
//! [`Outcome`](crate::types::Outcome).

use crate::config::{Config, QueryConfig};
use crate::types::Query;

/// Builds request URLs as `prefix + address + suffix`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryBuilder {
    prefix: String,
    suffix: String,
}

impl QueryBuilder {
    /// Create a builder from explicit URL fragments
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Create a builder from the `query` section of a configuration
    pub fn from_config(config: &Config) -> Self {
        Self::from(&config.query)
    }

    /// Build the request URL for one address
    ///
    /// # Examples
    ///
    /// ```
    /// use bulk_geocoder::QueryBuilder;
    ///
    /// let builder = QueryBuilder::new("https://geo.example/search?q=", "&page=1");
    /// let query = builder.build("406 ANG MO KIO AVE 10");
    /// assert_eq!(query.as_str(), "https://geo.example/search?q=406 ANG MO KIO AVE 10&page=1");
    /// ```
    pub fn build(&self, address: &str) -> Query {
        let mut url = String::with_capacity(self.prefix.len() + address.len() + self.suffix.len());
        url.push_str(&self.prefix);
        url.push_str(address);
        url.push_str(&self.suffix);
        Query::from(url)
    }

    /// Build request URLs for every address, preserving order and duplicates
    pub fn build_all<I, S>(&self, addresses: I) -> Vec<Query>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        addresses
            .into_iter()
            .map(|address| self.build(address.as_ref()))
            .collect()
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

impl From<&QueryConfig> for QueryBuilder {
    fn from(config: &QueryConfig) -> Self {
        Self::new(config.prefix.clone(), config.suffix.clone())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builder_targets_onemap_search() {
        let query = QueryBuilder::default().build("108 ANG MO KIO AVE 4");
        assert_eq!(
            query.as_str(),
            "https://developers.onemap.sg/commonapi/search?searchVal=108 ANG MO KIO AVE 4\
             &&returnGeom=Y&getAddrDetails=Y&pageNum=1"
        );
    }

    #[test]
    fn build_all_keeps_order_and_duplicates() {
        let builder = QueryBuilder::new("p/", "/s");
        let queries = builder.build_all(["b", "a", "b"]);
        let urls: Vec<_> = queries.iter().map(|q| q.as_str()).collect();
        assert_eq!(urls, vec!["p/b/s", "p/a/s", "p/b/s"]);
    }

    #[test]
    fn address_is_not_encoded_or_validated() {
        let builder = QueryBuilder::new("http://h/?q=", "");
        assert_eq!(builder.build("a&b=c#d").as_str(), "http://h/?q=a&b=c#d");
        assert_eq!(builder.build("").as_str(), "http://h/?q=");
    }

    #[test]
    fn from_config_uses_query_section() {
        let mut config = Config::default();
        config.query.prefix = "http://localhost/?s=".to_string();
        config.query.suffix = "&x=1".to_string();
        let builder = QueryBuilder::from_config(&config);
        assert_eq!(builder.build("A").as_str(), "http://localhost/?s=A&x=1");
    }
}
