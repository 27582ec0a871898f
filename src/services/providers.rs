// Collaborator Provider Service
// Implements the Sapling secondary scorer and SerpAPI source search

use reqwest::Client;
use serde_json::Value;
use std::env;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use super::config_store::{AppConfig, ConfigStore};
use crate::models::SourceResult;

const SAPLING_DEFAULT_URL: &str = "https://api.sapling.ai/api/v1/aidetect";
const SERPAPI_DEFAULT_URL: &str = "https://serpapi.com/search";

pub const SAPLING_PROVIDER: &str = "sapling";
pub const SERPAPI_PROVIDER: &str = "serpapi";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured")]
    MissingApiKey,
}

/// An external engine returning an AI probability for a text.
pub trait SecondaryTextScorer {
    /// Display name, used in the engine signal and the `engine` field.
    fn label(&self) -> &str;

    fn score(&self, text: &str) -> impl Future<Output = Result<f64, ProviderError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceQuery {
    /// Normalized text snippet, searched as an exact phrase.
    Text(String),
    /// Publicly reachable image URL for reverse image search.
    ImageUrl(String),
}

/// Web or reverse-image search for matching sources.
pub trait SourceSearch {
    fn search(
        &self,
        query: &SourceQuery,
    ) -> impl Future<Output = Result<Vec<SourceResult>, ProviderError>> + Send;
}

// ============ Sapling ============

pub struct SaplingClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl SaplingClient {
    pub fn new(api_key: Option<String>, base_url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        let url = base_url
            .or_else(|| env::var("SAPLING_API_URL").ok())
            .unwrap_or_else(|| SAPLING_DEFAULT_URL.to_string());
        Self { client, url, api_key }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            get_api_key(SAPLING_PROVIDER),
            config.secondary.base_url.clone(),
            Duration::from_secs(config.secondary.timeout_secs),
        )
    }
}

impl SecondaryTextScorer for SaplingClient {
    fn label(&self) -> &str {
        "Sapling AI"
    }

    async fn score(&self, text: &str) -> Result<f64, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let start = Instant::now();

        let request = serde_json::json!({ "key": api_key, "text": text });
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;
        let score = parse_sapling_score(&data)?;

        debug!(latency_ms = start.elapsed().as_millis() as u64, score, "sapling.scored");
        Ok(score)
    }
}

fn parse_sapling_score(data: &Value) -> Result<f64, ProviderError> {
    data.get("score")
        .and_then(Value::as_f64)
        .ok_or(ProviderError::MissingContent)
}

// ============ SerpAPI ============

pub struct SerpApiClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    max_results: usize,
}

impl SerpApiClient {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
        max_results: usize,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        let url = base_url
            .or_else(|| env::var("SERPAPI_API_URL").ok())
            .unwrap_or_else(|| SERPAPI_DEFAULT_URL.to_string());
        Self {
            client,
            url,
            api_key,
            max_results,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            get_api_key(SERPAPI_PROVIDER),
            config.search.base_url.clone(),
            Duration::from_secs(config.search.timeout_secs),
            config.search.max_results,
        )
    }
}

impl SourceSearch for SerpApiClient {
    async fn search(&self, query: &SourceQuery) -> Result<Vec<SourceResult>, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let num = self.max_results.to_string();

        let params: Vec<(&str, String)> = match query {
            SourceQuery::Text(snippet) => vec![
                ("engine", "google".to_string()),
                ("q", format!("\"{}\"", snippet)),
                ("num", num),
                ("api_key", api_key.to_string()),
            ],
            SourceQuery::ImageUrl(url) => vec![
                ("engine", "google_lens".to_string()),
                ("url", url.clone()),
                ("api_key", api_key.to_string()),
            ],
        };

        let response = self.client.get(&self.url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;
        let results = parse_search_results(&data, query, self.max_results);
        debug!(count = results.len(), "serpapi.results");
        Ok(results)
    }
}

/// Result list for a query kind: organic results for text; visual matches,
/// then image results, then organic results for images.
fn result_items<'a>(data: &'a Value, query: &SourceQuery) -> &'a [Value] {
    let keys: &[&str] = match query {
        SourceQuery::Text(_) => &["organic_results"],
        SourceQuery::ImageUrl(_) => &["visual_matches", "image_results", "organic_results"],
    };
    keys.iter()
        .find_map(|k| data.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn parse_search_results(data: &Value, query: &SourceQuery, max: usize) -> Vec<SourceResult> {
    result_items(data, query)
        .iter()
        .take(max)
        .map(|item| {
            let field = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
            let link = field("link");
            let source = field("source");
            let url = link.clone().or_else(|| source.clone()).unwrap_or_default();
            SourceResult {
                title: field("title").unwrap_or_default(),
                snippet: field("snippet").or_else(|| source.clone()).unwrap_or_default(),
                display_url: field("displayed_link").or(link).or(source).unwrap_or_default(),
                url,
                thumbnail: field("thumbnail"),
            }
        })
        .collect()
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    let env_keys = match provider {
        SAPLING_PROVIDER => vec!["SAPLING_API_KEY", "AUTHVERIFIER_SAPLING_API_KEY"],
        SERPAPI_PROVIDER => vec!["SERPAPI_API_KEY", "AUTHVERIFIER_SERPAPI_API_KEY"],
        _ => vec![],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    if let Some(store) = ConfigStore::open_default() {
        if let Ok(Some(key)) = store.get_api_key(provider) {
            return Some(key);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_sapling_score() {
        assert_eq!(
            parse_sapling_score(&json!({"score": 0.82, "sentence_scores": []})).unwrap(),
            0.82
        );
        assert!(matches!(
            parse_sapling_score(&json!({"error": "bad key"})),
            Err(ProviderError::MissingContent)
        ));
        assert!(parse_sapling_score(&json!({"score": "high"})).is_err());
    }

    #[test]
    fn test_text_results_use_organic_results() {
        let data = json!({
            "organic_results": [
                {"title": "A", "link": "https://a.example/1", "snippet": "s1", "displayed_link": "a.example"},
                {"title": "B", "link": "https://b.example/2"}
            ],
            "visual_matches": [{"title": "ignored"}]
        });
        let results = parse_search_results(&data, &SourceQuery::Text("x".into()), 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].display_url, "a.example");
        assert_eq!(results[1].display_url, "https://b.example/2");
        assert_eq!(results[1].snippet, "");
        assert_eq!(results[1].thumbnail, None);
    }

    #[test]
    fn test_image_results_prefer_visual_matches_and_fall_back_to_source() {
        let data = json!({
            "visual_matches": [
                {"title": "Lens", "source": "pinterest.com", "thumbnail": "https://t/1.jpg"}
            ],
            "organic_results": [{"title": "later"}]
        });
        let results = parse_search_results(&data, &SourceQuery::ImageUrl("u".into()), 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "pinterest.com");
        assert_eq!(results[0].snippet, "pinterest.com");
        assert_eq!(results[0].display_url, "pinterest.com");
        assert_eq!(results[0].thumbnail.as_deref(), Some("https://t/1.jpg"));
    }

    #[test]
    fn test_results_are_truncated() {
        let items: Vec<Value> = (0..9).map(|i| json!({"title": format!("r{}", i)})).collect();
        let data = json!({ "image_results": items });
        let results = parse_search_results(&data, &SourceQuery::ImageUrl("u".into()), 5);
        assert_eq!(results.len(), 5);
        assert_eq!(results[4].title, "r4");
        assert!(parse_search_results(&json!({}), &SourceQuery::Text("x".into()), 5).is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_short_circuits() {
        let sapling = SaplingClient::new(None, None, Duration::from_secs(1));
        assert!(matches!(sapling.score("text").await, Err(ProviderError::MissingApiKey)));

        let serp = SerpApiClient::new(None, None, Duration::from_secs(1), 5);
        let err = serp.search(&SourceQuery::Text("x".into())).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
    }

    #[test]
    fn test_client_creation() {
        let client = SaplingClient::new(
            None,
            Some("http://localhost:1/detect".into()),
            Duration::from_secs(1),
        );
        assert_eq!(client.url, "http://localhost:1/detect");
        assert_eq!(client.label(), "Sapling AI");
    }
}
