//! Legacy sitemap ping endpoints.

use crate::{SubmissionOutcome, Submitter};
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

pub const GOOGLE_PING_ENDPOINT: &str = "https://www.google.com/ping";
pub const BING_PING_ENDPOINT: &str = "https://www.bing.com/ping";

/// `GET {endpoint}?sitemap={url}` for each sitemap
pub struct PingSubmitter {
    client: reqwest::Client,
    name: &'static str,
    endpoint: String,
}

impl PingSubmitter {
    pub fn new(client: reqwest::Client, name: &'static str, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            name,
            endpoint: endpoint.into(),
        }
    }

    pub fn google(client: reqwest::Client) -> Self {
        Self::new(client, "google-ping", GOOGLE_PING_ENDPOINT)
    }

    pub fn bing(client: reqwest::Client) -> Self {
        Self::new(client, "bing-ping", BING_PING_ENDPOINT)
    }

    async fn ping(&self, sitemap_url: &str) -> SubmissionOutcome {
        let result = self
            .client
            .get(&self.endpoint)
            .query(&[("sitemap", sitemap_url)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(engine = self.name, sitemap = sitemap_url, "ping accepted");
                SubmissionOutcome::success(self.name, sitemap_url, response.status().to_string())
            }
            Ok(response) => {
                warn!(
                    engine = self.name,
                    sitemap = sitemap_url,
                    status = %response.status(),
                    "ping rejected"
                );
                SubmissionOutcome::failure(
                    self.name,
                    sitemap_url,
                    format!("HTTP {}", response.status()),
                )
            }
            Err(e) => {
                warn!(engine = self.name, sitemap = sitemap_url, error = %e, "ping failed");
                SubmissionOutcome::failure(self.name, sitemap_url, e.to_string())
            }
        }
    }
}

#[async_trait]
impl Submitter for PingSubmitter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn submit(&self, urls: &[String]) -> Vec<SubmissionOutcome> {
        join_all(urls.iter().map(|u| self.ping(u))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, extract::Query, http::StatusCode, routing::get};
    use std::collections::HashMap;

    async fn ping_handler(Query(params): Query<HashMap<String, String>>) -> StatusCode {
        match params.get("sitemap") {
            Some(url) if url.ends_with("/sitemap.xml") => StatusCode::OK,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    async fn serve() -> String {
        let app = Router::new().route("/ping", get(ping_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/ping", addr)
    }

    #[tokio::test]
    async fn test_ping_reports_each_sitemap() {
        let endpoint = serve().await;
        let submitter = PingSubmitter::new(reqwest::Client::new(), "test-ping", endpoint);

        let outcomes = submitter
            .submit(&[
                "https://www.muvfitness.it/sitemap.xml".to_string(),
                "https://www.muvfitness.it/feed.rss".to_string(),
            ])
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].ok);
        assert_eq!(outcomes[0].target, "test-ping");
        assert!(!outcomes[1].ok);
        assert_eq!(outcomes[1].detail, "HTTP 400 Bad Request");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_not_fatal() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submitter = PingSubmitter::new(
            reqwest::Client::new(),
            "dead-ping",
            format!("http://{}/ping", addr),
        );
        let outcomes = submitter
            .submit(&["https://www.muvfitness.it/sitemap.xml".to_string()])
            .await;
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].ok);
    }

    #[test]
    fn test_named_constructors() {
        assert_eq!(PingSubmitter::google(reqwest::Client::new()).name(), "google-ping");
        assert_eq!(PingSubmitter::bing(reqwest::Client::new()).name(), "bing-ping");
    }
}
