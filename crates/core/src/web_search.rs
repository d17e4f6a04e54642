//! You.com web search adapter.
//!
//! Hits come back in the same record shape as indexed chunks so they can be
//! reranked alongside them. Every failure mode folds into a [`SourceOutcome`];
//! nothing here is fatal to a chat request.

use crate::traits::WebSearch;
use crate::{ExternalResult, SearchError, SourceOutcome};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const YOU_SEARCH_ENDPOINT: &str = "https://api.ydc-index.io/search";
pub const WEB_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct YouSearchClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YouSearchResponse {
    #[serde(default)]
    hits: Vec<YouHit>,
}

#[derive(Debug, Deserialize)]
struct YouHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

impl YouSearchClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: YOU_SEARCH_ENDPOINT.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(
        &self,
        api_key: &str,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<ExternalResult>, SearchError> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("query", query.to_string()),
                ("num_web_results", num_results.to_string()),
            ],
        )?;

        let response = self
            .client
            .get(url)
            .header("X-API-Key", api_key)
            .timeout(WEB_SEARCH_TIMEOUT)
            .send()
            .await?;

        check_status(response.status())?;

        let parsed: YouSearchResponse = response.json().await?;
        Ok(map_hits(parsed.hits, num_results))
    }
}

/// Only a plain 200 carries hits; any other status, 2xx included, is a failure.
fn check_status(status: StatusCode) -> Result<(), SearchError> {
    if status != StatusCode::OK {
        return Err(SearchError::BackendResponse {
            backend: "you.com".to_string(),
            details: status.to_string(),
        });
    }
    Ok(())
}

/// Ids are `you_<n>` where `n` counts results already collected in this call.
fn map_hits(hits: Vec<YouHit>, num_results: usize) -> Vec<ExternalResult> {
    let mut results: Vec<ExternalResult> = Vec::new();
    for hit in hits.into_iter().take(num_results) {
        results.push(ExternalResult {
            id: format!("you_{}", results.len()),
            text: format!("{}. {}", hit.title, hit.description),
            title: hit.title,
            url: hit.url,
            snippet: hit.description,
        });
    }
    results
}

#[async_trait]
impl WebSearch for YouSearchClient {
    async fn search(&self, query: &str, num_results: usize) -> SourceOutcome<ExternalResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("YOU_API_KEY not set, skipping external search");
            return SourceOutcome::Disabled;
        };

        match self.fetch(api_key, query, num_results).await {
            Ok(results) => SourceOutcome::from_hits(results),
            Err(error) => {
                warn!(error = %error, "web search failed");
                SourceOutcome::Failed(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, description: &str) -> YouHit {
        YouHit {
            title: title.to_string(),
            url: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
            description: description.to_string(),
        }
    }

    #[test]
    fn hits_are_capped_and_numbered_by_position() {
        let hits = vec![
            hit("GDPR news", "Regulator fines retailer"),
            hit("Case law", "Court rules on consent"),
            hit("Extra", "should be dropped"),
        ];

        let results = map_hits(hits, 2);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "you_0");
        assert_eq!(results[1].id, "you_1");
        assert_eq!(results[0].snippet, "Regulator fines retailer");
        assert_eq!(results[0].text, "GDPR news. Regulator fines retailer");
    }

    #[test]
    fn response_without_hits_parses_empty() {
        let parsed: YouSearchResponse = serde_json::from_str(r#"{"latency": 0.2}"#).unwrap();
        assert!(parsed.hits.is_empty());
    }

    #[test]
    fn hit_fields_default_when_missing() {
        let parsed: YouSearchResponse =
            serde_json::from_str(r#"{"hits": [{"url": "https://x.test"}]}"#).unwrap();
        let results = map_hits(parsed.hits, 5);

        assert_eq!(results[0].title, "");
        assert_eq!(results[0].url, "https://x.test");
        assert_eq!(results[0].text, ". ");
    }

    #[test]
    fn only_ok_status_is_accepted() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::NO_CONTENT).is_err());
        assert!(check_status(StatusCode::ACCEPTED).is_err());
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(SearchError::BackendResponse { ref details, .. }) if details.starts_with("429")
        ));
    }

    #[tokio::test]
    async fn missing_key_disables_search() {
        let client = YouSearchClient::new(Some("   ".to_string()));
        assert!(!client.is_configured());
        assert_eq!(client.search("gdpr fines", 4).await, SourceOutcome::Disabled);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_failure_not_an_error() {
        let client = YouSearchClient::new(Some("key".to_string())).with_endpoint("http://127.0.0.1:1/search");
        let outcome = client.search("gdpr fines", 4).await;
        assert!(matches!(outcome, SourceOutcome::Failed(_)));
    }
}
