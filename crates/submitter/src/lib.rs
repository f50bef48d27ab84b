//! Search-engine submission targets (Google/Bing ping, IndexNow, Google
//! Search Console) and the job controller that runs them.
//!
//! Submission is best-effort: every target reports a [`SubmissionOutcome`]
//! per request and nothing here returns an error for a failed ping.

pub mod controller;
pub mod indexnow;
pub mod ledger;
pub mod ping;
pub mod search_console;
pub mod token;

use async_trait::async_trait;
use std::time::Duration;

pub use controller::{JobReport, JobStatus, PlannedJob, SubmissionController};
pub use indexnow::IndexNowSubmitter;
pub use ledger::{SubmissionJob, SubmissionLedger, content_digest};
pub use ping::PingSubmitter;
pub use search_console::{OAuthCredentials, SearchConsoleSubmitter};
pub use token::{CachedToken, TokenCache};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub target: String,
    /// What was submitted: a sitemap URL or a batch description
    pub subject: String,
    pub ok: bool,
    pub detail: String,
}

impl SubmissionOutcome {
    pub fn success(target: &str, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            subject: subject.into(),
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn failure(target: &str, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            subject: subject.into(),
            ok: false,
            detail: detail.into(),
        }
    }
}

/// A search engine endpoint that accepts URLs
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Stable identifier, also part of the job idempotency key
    fn name(&self) -> &'static str;

    async fn submit(&self, urls: &[String]) -> Vec<SubmissionOutcome>;
}

/// Shared HTTP client for submission targets.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("muv-seo/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
