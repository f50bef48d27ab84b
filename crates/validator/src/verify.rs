//! Filesystem verification of generated artifacts.

use crate::{CheckResult, ValidationReport};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// What a generated file must look like
#[derive(Debug, Clone, Copy)]
pub struct ArtifactSpec {
    pub file: &'static str,
    pub required: &'static [&'static str],
    /// Minimum number of `<loc>` entries; `None` for non-sitemap files
    pub min_urls: Option<usize>,
    /// A missing optional artifact is a warning, not a failure
    pub optional: bool,
}

pub const EXPECTED_ARTIFACTS: &[ArtifactSpec] = &[
    ArtifactSpec {
        file: "sitemap.xml",
        required: &["<sitemapindex", "<sitemap>"],
        min_urls: Some(1),
        optional: false,
    },
    ArtifactSpec {
        file: "sitemap-main.xml",
        required: &["<urlset", "<url>"],
        min_urls: Some(1),
        optional: false,
    },
    ArtifactSpec {
        file: "sitemap-blog.xml",
        required: &["<urlset"],
        min_urls: Some(0),
        optional: false,
    },
    ArtifactSpec {
        file: "sitemap-news.xml",
        required: &["<urlset", "xmlns:news"],
        min_urls: Some(0),
        optional: true,
    },
    ArtifactSpec {
        file: "robots.txt",
        required: &["User-agent:", "Sitemap:", "Disallow: /admin/"],
        min_urls: None,
        optional: false,
    },
];

/// Verify every expected artifact under `dir`.
pub fn verify_output_dir(dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();
    for spec in EXPECTED_ARTIFACTS {
        let path = dir.join(spec.file);
        if spec.optional && !path.exists() {
            report
                .warnings
                .push(format!("{}: not generated (optional)", spec.file));
            continue;
        }
        report.results.push(check_artifact(&path, spec));
    }
    report
}

/// Check a single file against its spec.
pub fn check_artifact(path: &Path, spec: &ArtifactSpec) -> CheckResult {
    let content = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return CheckResult::fail(spec.file, "File not found");
        }
        Err(e) => return CheckResult::fail(spec.file, format!("Unreadable: {}", e)),
    };

    if content.is_empty() {
        return CheckResult::fail(spec.file, "File is empty");
    }

    let text = String::from_utf8_lossy(&content);
    let missing: Vec<&str> = spec
        .required
        .iter()
        .copied()
        .filter(|needle| !text.contains(needle))
        .collect();
    if !missing.is_empty() {
        return CheckResult::fail(
            spec.file,
            format!("Missing required content: {}", missing.join(", ")),
        );
    }

    let Some(min_urls) = spec.min_urls else {
        return CheckResult::pass(spec.file, format!("{} bytes", content.len()));
    };

    let count = count_urls(&text);
    debug!(file = spec.file, urls = count, "verified sitemap");
    if count < min_urls {
        return CheckResult::fail(
            spec.file,
            format!("Expected at least {} URLs, found {}", min_urls, count),
        )
        .with_url_count(count);
    }
    CheckResult::pass(spec.file, format!("{} URLs", count)).with_url_count(count)
}

/// Number of `<loc>` entries in a sitemap document.
pub fn count_urls(xml: &str) -> usize {
    xml.matches("<loc>").count()
}

/// Prerendered `index.html` files under `dir` that carry a canonical link.
pub fn count_prerendered_pages(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == "index.html")
        .filter(|e| {
            fs::read_to_string(e.path())
                .map(|html| html.contains(r#"<link rel="canonical""#))
                .unwrap_or(false)
        })
        .count()
}
