//! IndexNow URL submission.

use crate::{SubmissionOutcome, Submitter};
use async_trait::async_trait;
use muv_seo_core::{IndexNowConfig, SiteConfig};
use serde::Serialize;
use tracing::{info, warn};

pub const INDEXNOW_ENDPOINT: &str = "https://api.indexnow.org/IndexNow";

/// IndexNow accepts at most this many URLs per request.
pub const MAX_URLS_PER_REQUEST: usize = 10_000;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexNowPayload<'a> {
    pub host: &'a str,
    pub key: &'a str,
    pub key_location: &'a str,
    pub url_list: &'a [String],
}

pub struct IndexNowSubmitter {
    client: reqwest::Client,
    endpoint: String,
    host: String,
    key: String,
    key_location: String,
}

impl IndexNowSubmitter {
    pub fn new(client: reqwest::Client, site: &SiteConfig, config: &IndexNowConfig) -> Self {
        let key_location = config
            .key_location
            .clone()
            .unwrap_or_else(|| site.absolute_url(&config.key_file_name()));
        Self {
            client,
            endpoint: INDEXNOW_ENDPOINT.to_string(),
            host: site.host().to_string(),
            key: config.key.clone(),
            key_location,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn payload<'a>(&'a self, urls: &'a [String]) -> IndexNowPayload<'a> {
        IndexNowPayload {
            host: &self.host,
            key: &self.key,
            key_location: &self.key_location,
            url_list: urls,
        }
    }

    async fn submit_batch(&self, batch: &[String]) -> SubmissionOutcome {
        let subject = format!("{} URLs", batch.len());
        let result = self
            .client
            .post(&self.endpoint)
            .json(&self.payload(batch))
            .send()
            .await;

        match result {
            // 200: accepted; 202: accepted, key validation pending
            Ok(response) if matches!(response.status().as_u16(), 200 | 202) => {
                info!(urls = batch.len(), status = %response.status(), "IndexNow accepted");
                SubmissionOutcome::success(self.name(), subject, response.status().to_string())
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, %body, "IndexNow rejected submission");
                SubmissionOutcome::failure(
                    self.name(),
                    subject,
                    format!("HTTP {} {}", status, body.trim()),
                )
            }
            Err(e) => {
                warn!(error = %e, "IndexNow request failed");
                SubmissionOutcome::failure(self.name(), subject, e.to_string())
            }
        }
    }
}

#[async_trait]
impl Submitter for IndexNowSubmitter {
    fn name(&self) -> &'static str {
        "indexnow"
    }

    async fn submit(&self, urls: &[String]) -> Vec<SubmissionOutcome> {
        let mut outcomes = Vec::new();
        for batch in urls.chunks(MAX_URLS_PER_REQUEST) {
            outcomes.push(self.submit_batch(batch).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::Value;

    fn site() -> SiteConfig {
        SiteConfig {
            base_url: "https://www.muvfitness.it".to_string(),
            name: "MUV Fitness".to_string(),
            language: "it".to_string(),
            default_og_image: None,
            twitter_handle: None,
            telephone: None,
        }
    }

    fn config() -> IndexNowConfig {
        IndexNowConfig {
            key: "a1b2c3d4e5f6a7b8".to_string(),
            key_location: None,
        }
    }

    #[test]
    fn test_payload_shape() {
        let submitter = IndexNowSubmitter::new(reqwest::Client::new(), &site(), &config());
        let urls = vec!["https://www.muvfitness.it/blog/ems-training".to_string()];
        let json = serde_json::to_value(submitter.payload(&urls)).unwrap();

        assert_eq!(json["host"], "www.muvfitness.it");
        assert_eq!(json["key"], "a1b2c3d4e5f6a7b8");
        assert_eq!(
            json["keyLocation"],
            "https://www.muvfitness.it/a1b2c3d4e5f6a7b8.txt"
        );
        assert_eq!(json["urlList"][0], "https://www.muvfitness.it/blog/ems-training");
    }

    #[test]
    fn test_explicit_key_location_wins() {
        let mut cfg = config();
        cfg.key_location = Some("https://www.muvfitness.it/keys/indexnow.txt".to_string());
        let submitter = IndexNowSubmitter::new(reqwest::Client::new(), &site(), &cfg);
        let json = serde_json::to_value(submitter.payload(&[])).unwrap();
        assert_eq!(json["keyLocation"], "https://www.muvfitness.it/keys/indexnow.txt");
    }

    async fn indexnow_handler(Json(body): Json<Value>) -> StatusCode {
        if body["urlList"].as_array().is_some_and(|l| !l.is_empty()) {
            StatusCode::ACCEPTED
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }

    #[tokio::test]
    async fn test_submit_against_local_endpoint() {
        let app = Router::new().route("/IndexNow", post(indexnow_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let submitter = IndexNowSubmitter::new(reqwest::Client::new(), &site(), &config())
            .with_endpoint(format!("http://{}/IndexNow", addr));

        let ok = submitter
            .submit(&["https://www.muvfitness.it/".to_string()])
            .await;
        assert_eq!(ok.len(), 1);
        assert!(ok[0].ok);
        assert_eq!(ok[0].subject, "1 URLs");

        let rejected = submitter.submit_batch(&[]).await;
        assert!(!rejected.ok);
        assert!(rejected.detail.starts_with("HTTP 422"));
    }

    #[tokio::test]
    async fn test_urls_are_batched() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        // nothing listens here; each batch still yields one outcome
        let submitter = IndexNowSubmitter::new(reqwest::Client::new(), &site(), &config())
            .with_endpoint(format!("http://{}/IndexNow", addr));
        let urls: Vec<String> = (0..MAX_URLS_PER_REQUEST + 1)
            .map(|i| format!("https://www.muvfitness.it/p/{}", i))
            .collect();
        let outcomes = submitter.submit(&urls).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.ok));
        assert_eq!(outcomes[1].subject, "1 URLs");
    }
}
