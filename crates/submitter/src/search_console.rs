//! Google Search Console sitemap submission.
//!
//! Uses an OAuth refresh token to mint access tokens, cached in a
//! [`TokenCache`] until shortly before they expire.

use crate::token::TokenCache;
use crate::{SubmissionOutcome, Submitter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use muv_seo_core::Clock;
use reqwest::Url;
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const API_BASE: &str = "https://www.googleapis.com/webmasters/v3";

const NAME: &str = "search-console";

/// OAuth client plus a long-lived refresh token
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl OAuthCredentials {
    /// Read `GSC_CLIENT_ID`, `GSC_CLIENT_SECRET` and `GSC_REFRESH_TOKEN`.
    /// Returns `None` unless all three are set.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            client_id: std::env::var("GSC_CLIENT_ID").ok()?,
            client_secret: std::env::var("GSC_CLIENT_SECRET").ok()?,
            refresh_token: std::env::var("GSC_REFRESH_TOKEN").ok()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

pub struct SearchConsoleSubmitter<C: Clock> {
    client: reqwest::Client,
    credentials: OAuthCredentials,
    /// Property URL as registered in Search Console, with trailing slash
    site_url: String,
    token_endpoint: String,
    api_base: String,
    tokens: Mutex<TokenCache<C>>,
}

impl<C: Clock> SearchConsoleSubmitter<C> {
    pub fn new(
        client: reqwest::Client,
        credentials: OAuthCredentials,
        base_url: &str,
        clock: C,
    ) -> Self {
        Self {
            client,
            credentials,
            site_url: format!("{}/", base_url.trim_end_matches('/')),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            api_base: API_BASE.to_string(),
            tokens: Mutex::new(TokenCache::new(clock)),
        }
    }

    pub fn with_endpoints(
        mut self,
        token_endpoint: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.token_endpoint = token_endpoint.into();
        self.api_base = api_base.into();
        self
    }

    /// `{api_base}/sites/{site}/sitemaps/{feed}` with both segments encoded.
    pub fn sitemap_endpoint(&self, feed_url: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).context("invalid Search Console API base")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Search Console API base cannot have a path"))?
            .pop_if_empty()
            .extend(["sites", self.site_url.as_str(), "sitemaps", feed_url]);
        Ok(url)
    }

    /// Lock the token cache, recovering it if a previous holder panicked.
    fn tokens(&self) -> MutexGuard<'_, TokenCache<C>> {
        self.tokens.lock().unwrap_or_else(|poisoned| {
            warn!("token cache mutex was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn cached_token(&self) -> Option<String> {
        self.tokens().get().map(str::to_string)
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            debug!("using cached Search Console token");
            return Ok(token);
        }

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("token endpoint returned {}: {}", status, body.trim());
        }

        let token: TokenResponse = response.json().await.context("malformed token response")?;
        self.tokens()
            .store(token.access_token.clone(), Duration::from_secs(token.expires_in));
        Ok(token.access_token)
    }

    async fn submit_sitemap(&self, token: &str, feed_url: &str) -> SubmissionOutcome {
        let endpoint = match self.sitemap_endpoint(feed_url) {
            Ok(url) => url,
            Err(e) => return SubmissionOutcome::failure(NAME, feed_url, e.to_string()),
        };

        match self.client.put(endpoint).bearer_auth(token).send().await {
            Ok(response) if response.status().is_success() => {
                info!(sitemap = feed_url, "submitted to Search Console");
                SubmissionOutcome::success(NAME, feed_url, response.status().to_string())
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(sitemap = feed_url, %status, "Search Console rejected sitemap");
                SubmissionOutcome::failure(
                    NAME,
                    feed_url,
                    format!("HTTP {} {}", status, body.trim()),
                )
            }
            Err(e) => {
                warn!(sitemap = feed_url, error = %e, "Search Console request failed");
                SubmissionOutcome::failure(NAME, feed_url, e.to_string())
            }
        }
    }
}

#[async_trait]
impl<C: Clock + 'static> Submitter for SearchConsoleSubmitter<C> {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn submit(&self, urls: &[String]) -> Vec<SubmissionOutcome> {
        let token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "cannot obtain Search Console token");
                return urls
                    .iter()
                    .map(|u| {
                        SubmissionOutcome::failure(self.name(), u.as_str(), format!("{:#}", e))
                    })
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(urls.len());
        for url in urls {
            outcomes.push(self.submit_sitemap(&token, url).await);
        }
        outcomes
    }
}
