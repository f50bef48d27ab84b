use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw TOML configuration structure
/// This matches the muv-seo.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    site: RawSite,
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    news: NewsConfig,
    #[serde(default)]
    robots: RobotsConfig,
    indexnow: Option<IndexNowConfig>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_site_name")]
    name: String,
    #[serde(default = "default_language")]
    language: String,
    default_og_image: Option<String>,
    twitter_handle: Option<String>,
    telephone: Option<String>,
}

impl Default for RawSite {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            name: default_site_name(),
            language: default_language(),
            default_og_image: None,
            twitter_handle: None,
            telephone: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPaths {
    #[serde(default = "default_routes_path")]
    routes: String,
    #[serde(default = "default_output_path")]
    output: String,
    template: Option<String>,
    posts_file: Option<String>,
}

impl Default for RawPaths {
    fn default() -> Self {
        Self {
            routes: default_routes_path(),
            output: default_output_path(),
            template: None,
            posts_file: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_site_name() -> String {
    "MUV Fitness".to_string()
}

fn default_language() -> String {
    "it".to_string()
}

fn default_routes_path() -> String {
    "routes.json".to_string()
}

fn default_output_path() -> String {
    "dist".to_string()
}

/// Parse muv-seo.toml from a file path.
///
/// Relative paths inside `[paths]` are resolved against the directory that
/// contains the config file.
pub fn parse_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parse_config_str(&content, base_dir)
}

/// Parse muv-seo.toml from a string (useful for testing)
pub fn parse_config_str(content: &str, base_dir: &Path) -> Result<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    let base_url = validate_base_url(&raw.site.base_url)?;

    if raw.news.window_hours == 0 {
        return Err(Error::ConfigParse(
            "news.window_hours must be greater than zero".to_string(),
        ));
    }

    if let Some(indexnow) = &raw.indexnow
        && !is_valid_indexnow_key(&indexnow.key)
    {
        return Err(Error::ConfigParse(format!(
            "indexnow.key must be 8-128 characters of a-z, A-Z, 0-9 or '-': '{}'",
            indexnow.key
        )));
    }

    for path in &raw.robots.extra_disallow {
        if !path.starts_with('/') {
            return Err(Error::ConfigParse(format!(
                "robots.extra_disallow entries must start with '/': '{}'",
                path
            )));
        }
    }

    let resolve = |value: &str, field: &str| -> Result<PathBuf> {
        Ok(base_dir.join(validate_path(value, field)?))
    };

    let paths = PathsConfig {
        routes: resolve(&raw.paths.routes, "paths.routes")?,
        output: resolve(&raw.paths.output, "paths.output")?,
        template: raw
            .paths
            .template
            .as_deref()
            .map(|t| resolve(t, "paths.template"))
            .transpose()?,
        posts_file: raw
            .paths
            .posts_file
            .as_deref()
            .map(|p| resolve(p, "paths.posts_file"))
            .transpose()?,
    };

    let default_og_image = raw
        .site
        .default_og_image
        .map(|img| {
            if img.starts_with("https://") {
                img
            } else {
                format!("{}/{}", base_url, img.trim_start_matches('/'))
            }
        });

    Ok(Settings {
        site: SiteConfig {
            base_url,
            name: raw.site.name,
            language: raw.site.language,
            default_og_image,
            twitter_handle: raw.site.twitter_handle,
            telephone: raw.site.telephone,
        },
        paths,
        news: raw.news,
        robots: raw.robots,
        indexnow: raw.indexnow,
    })
}

/// Sitemap URLs must be absolute HTTPS; the trailing slash is dropped so
/// route paths can be appended directly.
fn validate_base_url(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let Some(host) = trimmed.strip_prefix("https://") else {
        return Err(Error::ConfigParse(format!(
            "site.base_url must be an absolute https:// URL: '{}'",
            value
        )));
    };
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(Error::ConfigParse(format!(
            "site.base_url has no valid host: '{}'",
            value
        )));
    }
    Ok(trimmed.to_string())
}

fn is_valid_indexnow_key(key: &str) -> bool {
    (8..=128).contains(&key.len()) && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validate and convert a path string to PathBuf.
///
/// This function prevents path traversal by rejecting:
/// - Absolute paths (starting with `/` or Windows drive letters)
/// - Paths containing parent directory references (`..`)
///
/// # Arguments
///
/// * `path_str` - The path string from user input (muv-seo.toml)
/// * `field_name` - Name of the field for error messages
///
/// # Examples
///
/// ```text
/// validate_path("routes.json", "paths.routes")  → Ok(PathBuf)
/// validate_path("dist/index.html", "paths.template")  → Ok(PathBuf)
///
/// validate_path("/etc/passwd", "paths.routes")  → Err("Absolute paths not allowed...")
/// validate_path("../secrets.json", "paths.posts_file")  → Err("Parent directory references...")
/// ```
pub fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    // Reject absolute paths
    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    // Check for parent directory references
    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    // Ensure path is not empty
    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}
