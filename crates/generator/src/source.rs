//! Where blog post summaries come from.
//!
//! Production reads the `blog_posts` table through the hosted PostgREST API;
//! offline builds and tests read a JSON export with the same row shape.

use async_trait::async_trait;
use muv_seo_core::{BlogPost, Error, Result, Settings};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const POST_COLUMNS: &str = "slug,title,status,published_at,updated_at,meta_keywords";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch post summaries. Implementations may pre-filter to published
    /// rows; callers still filter on status.
    async fn fetch_posts(&self) -> Result<Vec<BlogPost>>;

    /// Human-readable origin for log lines
    fn describe(&self) -> String;
}

/// Posts exported to a local JSON array
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PostSource for JsonFileSource {
    async fn fetch_posts(&self) -> Result<Vec<BlogPost>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::DataSource(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let posts: Vec<BlogPost> = serde_json::from_str(&content).map_err(|e| {
            Error::DataSource(format!("malformed posts file {}: {}", self.path.display(), e))
        })?;
        info!(count = posts.len(), source = %self.path.display(), "loaded posts");
        Ok(posts)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Supabase PostgREST client for the `blog_posts` table
pub struct SupabaseSource {
    client: reqwest::Client,
    project_url: String,
}

impl SupabaseSource {
    pub fn new(project_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| Error::ConfigParse(format!("invalid Supabase key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| Error::ConfigParse(format!("invalid Supabase key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::DataSource(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            project_url: project_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from `SUPABASE_URL` plus `SUPABASE_SERVICE_ROLE_KEY` or
    /// `SUPABASE_ANON_KEY`. Returns `None` when the URL is not set.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("SUPABASE_URL") else {
            return Ok(None);
        };
        let key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
            .map_err(|_| {
                Error::ConfigParse(
                    "SUPABASE_URL is set but neither SUPABASE_SERVICE_ROLE_KEY nor SUPABASE_ANON_KEY is"
                        .to_string(),
                )
            })?;
        Self::new(&url, &key).map(Some)
    }

    pub fn query_url(&self) -> String {
        format!(
            "{}/rest/v1/blog_posts?select={}&status=eq.published&order=published_at.desc",
            self.project_url, POST_COLUMNS
        )
    }
}

#[async_trait]
impl PostSource for SupabaseSource {
    async fn fetch_posts(&self) -> Result<Vec<BlogPost>> {
        let response = self
            .client
            .get(self.query_url())
            .send()
            .await
            .map_err(|e| Error::DataSource(format!("blog_posts query failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::DataSource(format!("blog_posts response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(Error::DataSource(format!(
                "blog_posts query returned {}: {}",
                status, body
            )));
        }

        let posts: Vec<BlogPost> = serde_json::from_str(&body)
            .map_err(|e| Error::DataSource(format!("unexpected blog_posts payload: {}", e)))?;
        info!(count = posts.len(), "fetched posts from Supabase");
        Ok(posts)
    }

    fn describe(&self) -> String {
        format!("Supabase {}", self.project_url)
    }
}

/// Pick the post source for these settings: a configured `posts_file` wins,
/// otherwise the Supabase environment variables.
pub fn source_from_settings(settings: &Settings) -> Result<Box<dyn PostSource>> {
    if let Some(path) = &settings.paths.posts_file {
        return Ok(Box::new(JsonFileSource::new(path.clone())));
    }
    match SupabaseSource::from_env()? {
        Some(source) => Ok(Box::new(source)),
        None => Err(Error::ConfigParse(
            "no post source: set paths.posts_file or SUPABASE_URL".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muv_seo_core::PostStatus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_file_source_reads_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(
            &path,
            r#"[
                {"slug": "ems-training", "title": "EMS", "status": "published",
                 "published_at": "2024-01-01T09:00:00+00:00", "updated_at": null,
                 "meta_keywords": "ems"},
                {"slug": "bozza", "title": "Bozza", "status": "draft"}
            ]"#,
        )
        .unwrap();

        let source = JsonFileSource::new(&path);
        let posts = source.fetch_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].status, PostStatus::Published);
        assert_eq!(posts[1].status, PostStatus::Draft);
        assert!(source.describe().contains("posts.json"));
    }

    #[tokio::test]
    async fn test_json_file_source_missing_file_is_data_source_error() {
        let source = JsonFileSource::new("/nonexistent/posts.json");
        let err = source.fetch_posts().await.unwrap_err();
        assert!(matches!(err, Error::DataSource(_)));
    }

    #[tokio::test]
    async fn test_json_file_source_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonFileSource::new(&path).fetch_posts().await.unwrap_err();
        assert!(err.to_string().contains("malformed posts file"));
    }

    #[test]
    fn test_supabase_query_url() {
        let source = SupabaseSource::new("https://abc.supabase.co/", "anon-key").unwrap();
        assert_eq!(
            source.query_url(),
            "https://abc.supabase.co/rest/v1/blog_posts?select=slug,title,status,published_at,updated_at,meta_keywords&status=eq.published&order=published_at.desc"
        );
        assert_eq!(source.describe(), "Supabase https://abc.supabase.co");
    }

    #[test]
    fn test_supabase_rejects_unprintable_key() {
        assert!(SupabaseSource::new("https://abc.supabase.co", "bad\nkey").is_err());
    }
}
