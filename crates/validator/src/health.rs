//! HTTP health check of the deployed SEO files.
//!
//! Every target gets one `HEAD` request. There is no retry: a timeout or
//! connection error counts as a failure just like a 404.

use crate::{CheckResult, ValidationReport};
use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A deployed URL and the content type it must be served with
#[derive(Debug, Clone, PartialEq)]
pub struct HealthTarget {
    pub url: String,
    /// Substring expected in the `Content-Type` header
    pub expected_content_type: &'static str,
}

/// The sitemap family plus robots.txt under `base_url`.
pub fn default_targets(base_url: &str) -> Vec<HealthTarget> {
    let base = base_url.trim_end_matches('/');
    let xml = |file: &str| HealthTarget {
        url: format!("{}/{}", base, file),
        expected_content_type: "xml",
    };
    vec![
        xml("sitemap.xml"),
        xml("sitemap-main.xml"),
        xml("sitemap-blog.xml"),
        xml("sitemap-news.xml"),
        HealthTarget {
            url: format!("{}/robots.txt", base),
            expected_content_type: "text/plain",
        },
    ]
}

pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("muv-seo/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Judge a response by status and content type.
pub fn evaluate(status: u16, content_type: Option<&str>, expected: &str) -> Result<(), String> {
    if !(200..300).contains(&status) {
        return Err(format!("HTTP {}", status));
    }
    match content_type {
        Some(ct) if ct.to_ascii_lowercase().contains(expected) => Ok(()),
        Some(ct) => Err(format!("Unexpected content type '{}' (expected {})", ct, expected)),
        None => Err(format!("Missing content type (expected {})", expected)),
    }
}

async fn check_target(client: &reqwest::Client, target: &HealthTarget) -> CheckResult {
    match client.head(&target.url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            match evaluate(status, content_type, target.expected_content_type) {
                Ok(()) => CheckResult::pass(&target.url, format!("HTTP {}", status)),
                Err(reason) => {
                    warn!(url = %target.url, %reason, "health check failed");
                    CheckResult::fail(&target.url, reason)
                }
            }
        }
        Err(e) => {
            warn!(url = %target.url, error = %e, "health check request failed");
            CheckResult::fail(&target.url, format!("Request failed: {}", e))
        }
    }
}

/// HEAD every target concurrently and collect the results in target order.
pub async fn check_targets(client: &reqwest::Client, targets: &[HealthTarget]) -> ValidationReport {
    let results = join_all(targets.iter().map(|t| check_target(client, t))).await;
    ValidationReport {
        results,
        warnings: Vec::new(),
    }
}
