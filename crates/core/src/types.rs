use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Canonical production origin of the site.
pub const DEFAULT_BASE_URL: &str = "https://www.muvfitness.it";

/// Sitemap change frequency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

/// One entry of the route registry (`routes.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub path: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    pub priority: f64,
    pub changefreq: ChangeFreq,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// Publication state of a blog post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
    /// Any status the CMS may add later; never published.
    #[serde(other)]
    Unknown,
}

/// Read-only projection of a `blog_posts` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, with = "flexible_datetime")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    pub status: PostStatus,
    #[serde(default)]
    pub meta_keywords: Option<String>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// The most recent of `published_at` and `updated_at`.
    pub fn freshness(&self) -> Option<DateTime<Utc>> {
        match (self.published_at, self.updated_at) {
            (Some(p), Some(u)) => Some(p.max(u)),
            (p, u) => p.or(u),
        }
    }

    /// Date used for `<lastmod>`: last update, falling back to publication.
    pub fn last_modified(&self) -> Option<NaiveDate> {
        self.updated_at
            .or(self.published_at)
            .map(|d| d.date_naive())
    }

    /// Trimmed slug, if present and non-empty.
    pub fn slug(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A slug is URL-safe when it is a single path segment made of RFC 3986
/// unreserved characters (`A-Z a-z 0-9 - . _ ~`) and is not a dot segment.
pub fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.contains("..")
        && slug != "."
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}

/// Render a priority the way the registry wrote it (`1.0`, `0.8`, `0.85`).
pub fn format_priority(priority: f64) -> String {
    if priority.fract() == 0.0 {
        format!("{:.1}", priority)
    } else {
        format!("{}", priority)
    }
}

/// Fully validated settings loaded from `muv-seo.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub site: SiteConfig,
    pub paths: PathsConfig,
    pub news: NewsConfig,
    pub robots: RobotsConfig,
    pub indexnow: Option<IndexNowConfig>,
}

/// Site identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// `https://` origin without trailing slash
    pub base_url: String,
    pub name: String,
    pub language: String,
    pub default_og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

impl SiteConfig {
    /// Host part of the base URL (`www.muvfitness.it`).
    pub fn host(&self) -> &str {
        self.base_url
            .trim_start_matches("https://")
            .split('/')
            .next()
            .unwrap_or_default()
    }

    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Filesystem locations, already resolved against the config directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub routes: PathBuf,
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_file: Option<PathBuf>,
}

/// Google News sitemap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,
}

fn default_window_hours() -> u64 {
    48
}

impl NewsConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_hours * 3600)
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
        }
    }
}

/// robots.txt additions on top of the built-in rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotsConfig {
    #[serde(default)]
    pub extra_disallow: Vec<String>,
    #[serde(default)]
    pub extra_blocked_agents: Vec<String>,
}

/// IndexNow ownership key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexNowConfig {
    pub key: String,
    /// Public URL of the key file; defaults to `{base_url}/{key}.txt`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_location: Option<String>,
}

impl IndexNowConfig {
    pub fn key_file_name(&self) -> String {
        format!("{}.txt", self.key)
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC)
/// and bare `YYYY-MM-DD` dates (midnight UTC).
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        // PostgREST emits `+00:00` offsets but some exports use a space separator
        if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s))),
        }
    }
}
