//! Provider API client
//!
//! Two call shapes against the match-history provider: fetching one game
//! log's JSON by reference code, and fetching a player's bulk record feed by
//! name. Responses are returned as raw text; the client only validates shape
//! (the log payload must be a JSON object, the records response must contain
//! the feed block) so that callers decide how deep to parse.

use async_trait::async_trait;
use paifu_common::config::ProviderConfig;
use paifu_common::Error;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error as ThisError;

const USER_AGENT: &str = concat!("paifu/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Provider fetch errors
#[derive(Debug, ThisError)]
pub enum FetchError {
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("unexpected status {0} from provider")]
    Status(u16),

    /// Response arrived but its shape is unusable
    #[error("unusable provider payload: {0}")]
    Payload(String),

    /// A worker executing the fetch reported a failure
    #[error("worker fetch failed: {0}")]
    Remote(String),
}

/// Abstract provider access, one implementation per transport
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Fetch one game log's raw JSON by normalized reference code
    async fn fetch_log(&self, ref_code: &str) -> Result<String, FetchError>;

    /// Fetch a player's bulk record feed, one record per line
    async fn fetch_records(&self, player_name: &str) -> Result<String, FetchError>;
}

/// HTTP client against the Tenhou endpoints
pub struct TenhouClient {
    http: reqwest::Client,
    log_url: String,
    records_url: String,
    records_re: Regex,
}

impl TenhouClient {
    pub fn new(provider: &ProviderConfig) -> paifu_common::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        let records_re = Regex::new(&provider.records_pattern)
            .map_err(|e| Error::Config(format!("invalid records pattern: {}", e)))?;

        Ok(Self {
            http,
            log_url: provider.log_url.clone(),
            records_url: provider.records_url.clone(),
            records_re,
        })
    }
}

#[async_trait]
impl ProviderClient for TenhouClient {
    async fn fetch_log(&self, ref_code: &str) -> Result<String, FetchError> {
        // The provider takes the bare reference as the whole query string
        let url = format!("{}?{}", self.log_url, ref_code);
        tracing::debug!(ref_code, url = %url, "fetching game log");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::REFERER, &self.log_url)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if !body.trim_start().starts_with('{') {
            return Err(FetchError::Payload(
                "log payload is not a JSON object".to_string(),
            ));
        }

        Ok(body)
    }

    async fn fetch_records(&self, player_name: &str) -> Result<String, FetchError> {
        tracing::debug!(player = player_name, "fetching record feed");

        let response = self
            .http
            .get(&self.records_url)
            .query(&[("name", player_name)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        extract_records(&self.records_re, &body)
    }
}

/// Pull the record feed block out of the provider's response
pub fn extract_records(records_re: &Regex, body: &str) -> Result<String, FetchError> {
    let captures = records_re.captures(body).ok_or_else(|| {
        FetchError::Payload("records pattern did not match response".to_string())
    })?;

    let feed = captures.name("records").ok_or_else(|| {
        FetchError::Payload("records pattern is missing a 'records' capture group".to_string())
    })?;

    Ok(feed.as_str().to_string())
}

/// The parts of the provider's log JSON the ingest path reads
///
/// The full payload is stored verbatim; only the participant list is lifted
/// out of it here.
#[derive(Debug, Clone, Deserialize)]
pub struct LogPayload {
    /// Participant names in seat order
    #[serde(rename = "name")]
    pub player_names: Vec<String>,
}

impl LogPayload {
    /// Parse and shape-check a raw log payload
    pub fn parse(body: &str) -> Result<LogPayload, FetchError> {
        let payload: LogPayload = serde_json::from_str(body)
            .map_err(|e| FetchError::Payload(format!("cannot parse log payload: {}", e)))?;

        if payload.player_names.is_empty() {
            return Err(FetchError::Payload(
                "log payload has no participants".to_string(),
            ));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paifu_common::config::ProviderConfig;

    #[test]
    fn test_client_creation() {
        assert!(TenhouClient::new(&ProviderConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_records_pattern_is_config_error() {
        let provider = ProviderConfig {
            records_pattern: "([unclosed".to_string(),
            ..ProviderConfig::default()
        };
        assert!(TenhouClient::new(&provider).is_err());
    }

    #[test]
    fn test_extract_records_from_page() {
        let re = Regex::new(&ProviderConfig::default().records_pattern).unwrap();
        let body = "header junk\nL0000|10|2024-01-05 21:00|rule|---|A+1B-1\nL0000|12|2024-01-05 22:00|rule|---|A+2B-2\n";

        let feed = extract_records(&re, body).unwrap();
        assert!(feed.starts_with("L0000|10|"));
        assert_eq!(feed.lines().count(), 2);
    }

    #[test]
    fn test_extract_records_without_match_is_payload_error() {
        let re = Regex::new(&ProviderConfig::default().records_pattern).unwrap();
        let err = extract_records(&re, "<html>no records here</html>").unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }

    #[test]
    fn test_extract_records_requires_named_group() {
        let re = Regex::new(r"(?s)(L\d+\|.*)").unwrap();
        let err = extract_records(&re, "L0000|10|x|y|---|A+1B-1").unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }

    #[test]
    fn test_log_payload_parse() {
        let payload =
            LogPayload::parse(r#"{"title":["x",""],"name":["Alice","Bob","Carol","Dave"],"rule":{"disp":"四鳳南喰赤"},"log":[]}"#)
                .unwrap();
        assert_eq!(payload.player_names, vec!["Alice", "Bob", "Carol", "Dave"]);
    }

    #[test]
    fn test_log_payload_rejects_garbage() {
        assert!(LogPayload::parse("<html></html>").is_err());
        assert!(LogPayload::parse("{}").is_err());
        assert!(LogPayload::parse(r#"{"name":[]}"#).is_err());
    }
}
