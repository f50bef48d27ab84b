//! Per-route `<head>` prerendering.
//!
//! The bundler emits a single `index.html`. Crawlers that do not run
//! JavaScript only ever see its default `<head>`, so for every registry
//! route we swap the block between [`SEO_START_MARKER`] and
//! [`SEO_END_MARKER`] for route-specific tags and write
//! `<output>/<route>/index.html`.

use crate::markup::escape;
use crate::structured_data::{absolute, json_ld_for, script_tag};
use muv_seo_core::{RouteDescriptor, SiteConfig, registry::validate_route_path};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SEO_START_MARKER: &str = "<!-- Default SEO -->";
pub const SEO_END_MARKER: &str = "<!-- /Default SEO -->";

#[derive(Debug)]
pub enum PrerenderError {
    /// The template has no (or an unterminated) default SEO block
    MissingMarkers,
    InvalidPath(String),
    Io(std::io::Error),
}

impl fmt::Display for PrerenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrerenderError::MissingMarkers => write!(
                f,
                "template is missing the '{}' ... '{}' block",
                SEO_START_MARKER, SEO_END_MARKER
            ),
            PrerenderError::InvalidPath(msg) => write!(f, "invalid route path: {}", msg),
            PrerenderError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for PrerenderError {}

impl From<std::io::Error> for PrerenderError {
    fn from(err: std::io::Error) -> Self {
        PrerenderError::Io(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteFailure {
    pub path: String,
    pub error: String,
}

/// Outcome of a prerender pass
#[derive(Debug, Default)]
pub struct PrerenderReport {
    pub total: usize,
    pub written: Vec<PathBuf>,
    pub failures: Vec<RouteFailure>,
}

impl PrerenderReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!("{}/{} routes prerendered", self.written.len(), self.total)
    }
}

/// Route-specific tags that replace the default SEO block.
pub fn render_head(route: &RouteDescriptor, site: &SiteConfig) -> String {
    let canonical = site.absolute_url(&route.path);
    let title = escape(&route.title);
    let description = escape(&route.description);
    let image = route
        .og_image
        .as_deref()
        .or(site.default_og_image.as_deref())
        .map(|img| escape(&absolute(site, img)));

    let mut tags = vec![
        format!("<title>{}</title>", title),
        format!(r#"<meta name="description" content="{}" />"#, description),
    ];
    if let Some(keywords) = route.keywords.as_deref().filter(|k| !k.trim().is_empty()) {
        tags.push(format!(
            r#"<meta name="keywords" content="{}" />"#,
            escape(keywords.trim())
        ));
    }
    tags.push(format!(r#"<link rel="canonical" href="{}" />"#, escape(&canonical)));

    tags.push(r#"<meta property="og:type" content="website" />"#.to_string());
    tags.push(format!(r#"<meta property="og:title" content="{}" />"#, title));
    tags.push(format!(
        r#"<meta property="og:description" content="{}" />"#,
        description
    ));
    tags.push(format!(r#"<meta property="og:url" content="{}" />"#, escape(&canonical)));
    tags.push(format!(
        r#"<meta property="og:site_name" content="{}" />"#,
        escape(&site.name)
    ));
    tags.push(r#"<meta property="og:locale" content="it_IT" />"#.to_string());
    if let Some(image) = &image {
        tags.push(format!(r#"<meta property="og:image" content="{}" />"#, image));
    }

    tags.push(r#"<meta name="twitter:card" content="summary_large_image" />"#.to_string());
    tags.push(format!(r#"<meta name="twitter:title" content="{}" />"#, title));
    tags.push(format!(
        r#"<meta name="twitter:description" content="{}" />"#,
        description
    ));
    if let Some(image) = &image {
        tags.push(format!(r#"<meta name="twitter:image" content="{}" />"#, image));
    }
    if let Some(handle) = &site.twitter_handle {
        tags.push(format!(
            r#"<meta name="twitter:site" content="{}" />"#,
            escape(handle)
        ));
    }

    tags.push(script_tag(&json_ld_for(route, site)));

    tags.join("\n    ")
}

/// Replace the contents of the default SEO block, keeping both markers.
pub fn apply_head(template: &str, head: &str) -> Result<String, PrerenderError> {
    let start = template
        .find(SEO_START_MARKER)
        .ok_or(PrerenderError::MissingMarkers)?;
    let content_start = start + SEO_START_MARKER.len();
    let end = template[content_start..]
        .find(SEO_END_MARKER)
        .map(|offset| content_start + offset)
        .ok_or(PrerenderError::MissingMarkers)?;

    let mut out = String::with_capacity(template.len() + head.len());
    out.push_str(&template[..content_start]);
    out.push_str("\n    ");
    out.push_str(head);
    out.push_str("\n    ");
    out.push_str(&template[end..]);
    Ok(out)
}

/// `/` maps to `<output>/index.html`, `/a/b` to `<output>/a/b/index.html`.
pub fn output_path_for(output_dir: &Path, route_path: &str) -> Result<PathBuf, PrerenderError> {
    validate_route_path(route_path).map_err(|e| PrerenderError::InvalidPath(e.to_string()))?;

    let mut path = output_dir.to_path_buf();
    for segment in route_path.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push("index.html");
    Ok(path)
}

fn prerender_route(
    template: &str,
    route: &RouteDescriptor,
    site: &SiteConfig,
    output_dir: &Path,
) -> Result<PathBuf, PrerenderError> {
    let html = apply_head(template, &render_head(route, site))?;
    let target = output_path_for(output_dir, &route.path)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, html)?;
    Ok(target)
}

/// Prerender every route; a failing route is logged and recorded, the rest
/// are still processed.
pub fn prerender_routes(
    template: &str,
    routes: &[RouteDescriptor],
    site: &SiteConfig,
    output_dir: &Path,
) -> PrerenderReport {
    let mut report = PrerenderReport {
        total: routes.len(),
        ..Default::default()
    };

    for route in routes {
        match prerender_route(template, route, site, output_dir) {
            Ok(path) => {
                info!(route = %route.path, file = %path.display(), "prerendered");
                report.written.push(path);
            }
            Err(e) => {
                warn!(route = %route.path, error = %e, "prerender failed");
                report.failures.push(RouteFailure {
                    path: route.path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use muv_seo_core::ChangeFreq;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="it">
  <head>
    <meta charset="UTF-8" />
    <!-- Default SEO -->
    <title>MUV Fitness</title>
    <meta name="description" content="default" />
    <!-- /Default SEO -->
    <script type="module" src="/assets/index.js"></script>
  </head>
  <body><div id="root"></div></body>
</html>
"#;

    fn site() -> SiteConfig {
        SiteConfig {
            base_url: "https://www.muvfitness.it".to_string(),
            name: "MUV Fitness".to_string(),
            language: "it".to_string(),
            default_og_image: Some("https://www.muvfitness.it/og-image.jpg".to_string()),
            twitter_handle: Some("@muvfitness".to_string()),
            telephone: None,
        }
    }

    fn route(path: &str, title: &str) -> RouteDescriptor {
        RouteDescriptor {
            path: path.to_string(),
            title: title.to_string(),
            description: format!("Descrizione {}", title),
            keywords: Some("palestra, legnago".to_string()),
            priority: 0.8,
            changefreq: ChangeFreq::Weekly,
            lastmod: None,
            og_image: None,
        }
    }

    #[test]
    fn test_render_head_contains_all_tag_families() {
        let head = render_head(&route("/servizi/ems", "EMS & Pilates"), &site());

        assert!(head.contains("<title>EMS &amp; Pilates</title>"));
        assert!(head.contains(r#"<meta name="keywords" content="palestra, legnago" />"#));
        assert!(head.contains(
            r#"<link rel="canonical" href="https://www.muvfitness.it/servizi/ems" />"#
        ));
        assert!(head.contains(r#"<meta property="og:title" content="EMS &amp; Pilates" />"#));
        assert!(head.contains(
            r#"<meta property="og:image" content="https://www.muvfitness.it/og-image.jpg" />"#
        ));
        assert!(head.contains(r#"<meta name="twitter:card" content="summary_large_image" />"#));
        assert!(head.contains(r#"<meta name="twitter:site" content="@muvfitness" />"#));
        assert!(head.contains("application/ld+json"));
    }

    #[test]
    fn test_route_og_image_overrides_default() {
        let mut r = route("/prezzi", "Prezzi");
        r.og_image = Some("/images/prezzi.jpg".to_string());
        let head = render_head(&r, &site());
        assert!(head.contains("https://www.muvfitness.it/images/prezzi.jpg"));
        assert!(!head.contains("og-image.jpg"));
    }

    #[test]
    fn test_apply_head_replaces_only_marked_block() {
        let html = apply_head(TEMPLATE, "<title>Nuovo</title>").unwrap();
        assert!(html.contains("<title>Nuovo</title>"));
        assert!(!html.contains("<title>MUV Fitness</title>"));
        assert!(!html.contains(r#"content="default""#));
        assert!(html.contains(SEO_START_MARKER));
        assert!(html.contains(SEO_END_MARKER));
        assert!(html.contains(r#"<script type="module" src="/assets/index.js"></script>"#));
    }

    #[test]
    fn test_apply_head_missing_markers_is_an_error() {
        let result = apply_head("<html><head></head></html>", "<title>x</title>");
        assert!(matches!(result, Err(PrerenderError::MissingMarkers)));

        let unterminated = "<head><!-- Default SEO --><title>x</title></head>";
        assert!(matches!(
            apply_head(unterminated, "<title>y</title>"),
            Err(PrerenderError::MissingMarkers)
        ));
    }

    #[test]
    fn test_output_path_mapping() {
        let out = Path::new("/tmp/dist");
        assert_eq!(output_path_for(out, "/").unwrap(), out.join("index.html"));
        assert_eq!(
            output_path_for(out, "/chi-siamo").unwrap(),
            out.join("chi-siamo").join("index.html")
        );
        assert_eq!(
            output_path_for(out, "/servizi/ems/").unwrap(),
            out.join("servizi").join("ems").join("index.html")
        );
        assert!(matches!(
            output_path_for(out, "/../../etc"),
            Err(PrerenderError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_prerender_routes_writes_one_file_per_route() {
        let dir = TempDir::new().unwrap();
        let routes = vec![route("/", "Home"), route("/contatti", "Contatti")];

        let report = prerender_routes(TEMPLATE, &routes, &site(), dir.path());

        assert!(report.is_success());
        assert_eq!(report.summary(), "2/2 routes prerendered");
        let contatti = fs::read_to_string(dir.path().join("contatti/index.html")).unwrap();
        assert!(contatti.contains("<title>Contatti</title>"));
        assert!(contatti.contains("https://www.muvfitness.it/contatti"));
    }

    #[test]
    fn test_prerender_isolates_failing_route() {
        let dir = TempDir::new().unwrap();
        // A file where a directory is needed makes only this route fail
        fs::write(dir.path().join("blocked"), "not a directory").unwrap();
        let routes = vec![
            route("/", "Home"),
            route("/blocked/inner", "Bloccato"),
            route("/contatti", "Contatti"),
        ];

        let report = prerender_routes(TEMPLATE, &routes, &site(), dir.path());

        assert_eq!(report.total, 3);
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "/blocked/inner");
        assert!(dir.path().join("contatti/index.html").exists());
    }

    #[test]
    fn test_prerender_without_markers_fails_every_route() {
        let dir = TempDir::new().unwrap();
        let routes = vec![route("/", "Home")];
        let report = prerender_routes("<html></html>", &routes, &site(), dir.path());
        assert!(!report.is_success());
        assert_eq!(report.summary(), "0/1 routes prerendered");
        assert!(report.failures[0].error.contains("Default SEO"));
        assert!(!dir.path().join("index.html").exists());
    }
}
