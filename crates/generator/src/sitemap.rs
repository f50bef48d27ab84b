//! Sitemap rendering.
//!
//! Every entry point (the `generate` command, the orchestrated `run` and the
//! live `serve` endpoint) goes through [`build_sitemaps`], so the four
//! documents can never drift apart.

use crate::markup::escape;
use chrono::{DateTime, SecondsFormat, Utc};
use muv_seo_core::{BlogPost, RouteDescriptor, Settings, format_priority, is_url_safe_slug};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const INDEX_SITEMAP: &str = "sitemap.xml";
pub const MAIN_SITEMAP: &str = "sitemap-main.xml";
pub const BLOG_SITEMAP: &str = "sitemap-blog.xml";
pub const NEWS_SITEMAP: &str = "sitemap-news.xml";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const NEWS_NS: &str = "http://www.google.com/schemas/sitemap-news/0.9";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const BLOG_CHANGEFREQ: &str = "weekly";
const BLOG_PRIORITY: &str = "0.8";

/// Parameters shared by all sitemap documents
#[derive(Debug, Clone)]
pub struct SitemapOptions {
    /// `https://` origin without trailing slash
    pub base_url: String,
    /// How far back a post may be to appear in the news sitemap
    pub news_window: Duration,
    pub publication_name: String,
    pub publication_language: String,
}

impl SitemapOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.site.base_url.clone(),
            news_window: settings.news.window(),
            publication_name: settings.site.name.clone(),
            publication_language: settings.site.language.clone(),
        }
    }
}

/// The rendered sitemap family
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapSet {
    pub index: String,
    pub main: String,
    pub blog: String,
    pub news: String,
    pub main_urls: usize,
    pub blog_urls: usize,
    pub news_urls: usize,
}

impl SitemapSet {
    /// `(file name, contents)` for every document that should be on disk.
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        vec![
            (INDEX_SITEMAP, self.index.as_str()),
            (MAIN_SITEMAP, self.main.as_str()),
            (BLOG_SITEMAP, self.blog.as_str()),
            (NEWS_SITEMAP, self.news.as_str()),
        ]
    }

    /// Look up a document by its file name.
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files()
            .into_iter()
            .find(|(name, _)| *name == file_name)
            .map(|(_, body)| body)
    }

    /// Write every document into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> muv_seo_core::Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (name, body) in self.files() {
            let path = dir.join(name);
            fs::write(&path, body)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Render the main, blog, news and index sitemaps.
///
/// `now` supplies the fallback `<lastmod>` date and anchors the news window.
pub fn build_sitemaps(
    routes: &[RouteDescriptor],
    posts: &[BlogPost],
    now: DateTime<Utc>,
    options: &SitemapOptions,
) -> SitemapSet {
    let today = now.date_naive().format("%Y-%m-%d").to_string();
    let base = options.base_url.trim_end_matches('/');

    let mut main = open_urlset(false);
    for route in routes {
        let lastmod = route
            .lastmod
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| today.clone());
        push_url(
            &mut main,
            &format!("{}{}", base, route.path),
            &lastmod,
            route.changefreq.as_str(),
            &format_priority(route.priority),
        );
    }
    main.push_str("</urlset>\n");

    let posts = eligible_posts(posts);

    let mut blog = open_urlset(false);
    for post in &posts {
        let lastmod = post
            .last_modified()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| today.clone());
        push_url(
            &mut blog,
            &blog_post_url(base, post),
            &lastmod,
            BLOG_CHANGEFREQ,
            BLOG_PRIORITY,
        );
    }
    blog.push_str("</urlset>\n");

    let recent = news_posts(&posts, now, options.news_window);
    let mut news = open_urlset(true);
    for post in &recent {
        push_news_url(&mut news, base, post, options);
    }
    news.push_str("</urlset>\n");

    let mut children = vec![MAIN_SITEMAP, BLOG_SITEMAP];
    if !recent.is_empty() {
        children.push(NEWS_SITEMAP);
    }
    let index = render_index(base, &children, &today);

    debug!(
        main = routes.len(),
        blog = posts.len(),
        news = recent.len(),
        "rendered sitemaps"
    );

    SitemapSet {
        index,
        main,
        blog,
        news,
        main_urls: routes.len(),
        blog_urls: posts.len(),
        news_urls: recent.len(),
    }
}

/// Published posts with a usable slug, freshest first.
///
/// Posts without a slug are skipped silently; unsafe slugs and duplicates
/// are skipped with a warning. Ties on freshness are broken by slug so the
/// output order is stable across runs.
pub fn eligible_posts(posts: &[BlogPost]) -> Vec<&BlogPost> {
    let mut seen = HashSet::new();
    let mut eligible: Vec<&BlogPost> = posts
        .iter()
        .filter(|p| p.is_published())
        .filter(|p| match p.slug() {
            None => false,
            Some(slug) if !is_url_safe_slug(slug) => {
                warn!(slug, "skipping post with non URL-safe slug");
                false
            }
            Some(slug) => {
                if seen.insert(slug.to_string()) {
                    true
                } else {
                    warn!(slug, "skipping duplicate post slug");
                    false
                }
            }
        })
        .collect();

    eligible.sort_by(|a, b| {
        b.freshness()
            .cmp(&a.freshness())
            .then_with(|| a.slug().cmp(&b.slug()))
    });
    eligible
}

/// Posts whose freshness lies within `window` before `now`.
///
/// The boundary is inclusive; future-dated and undated posts never qualify.
pub fn news_posts<'a>(
    posts: &[&'a BlogPost],
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<&'a BlogPost> {
    let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
    posts
        .iter()
        .copied()
        .filter(|post| match post.freshness() {
            Some(fresh) => {
                let age = now.signed_duration_since(fresh);
                age >= chrono::Duration::zero() && age <= window
            }
            None => false,
        })
        .collect()
}

fn blog_post_url(base: &str, post: &BlogPost) -> String {
    format!("{}/blog/{}", base, post.slug().unwrap_or_default())
}

fn open_urlset(with_news: bool) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    if with_news {
        let _ = writeln!(
            out,
            r#"<urlset xmlns="{}" xmlns:news="{}">"#,
            SITEMAP_NS, NEWS_NS
        );
    } else {
        let _ = writeln!(out, r#"<urlset xmlns="{}">"#, SITEMAP_NS);
    }
    out
}

fn push_url(out: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    out.push_str("  <url>\n");
    let _ = writeln!(out, "    <loc>{}</loc>", escape(loc));
    let _ = writeln!(out, "    <lastmod>{}</lastmod>", lastmod);
    let _ = writeln!(out, "    <changefreq>{}</changefreq>", changefreq);
    let _ = writeln!(out, "    <priority>{}</priority>", priority);
    out.push_str("  </url>\n");
}

fn push_news_url(out: &mut String, base: &str, post: &BlogPost, options: &SitemapOptions) {
    let published = post
        .published_at
        .or(post.updated_at)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();

    out.push_str("  <url>\n");
    let _ = writeln!(out, "    <loc>{}</loc>", escape(&blog_post_url(base, post)));
    out.push_str("    <news:news>\n");
    out.push_str("      <news:publication>\n");
    let _ = writeln!(
        out,
        "        <news:name>{}</news:name>",
        escape(&options.publication_name)
    );
    let _ = writeln!(
        out,
        "        <news:language>{}</news:language>",
        escape(&options.publication_language)
    );
    out.push_str("      </news:publication>\n");
    let _ = writeln!(
        out,
        "      <news:publication_date>{}</news:publication_date>",
        published
    );
    let _ = writeln!(out, "      <news:title>{}</news:title>", escape(&post.title));
    if let Some(keywords) = post.meta_keywords.as_deref().filter(|k| !k.trim().is_empty()) {
        let _ = writeln!(
            out,
            "      <news:keywords>{}</news:keywords>",
            escape(keywords.trim())
        );
    }
    out.push_str("    </news:news>\n");
    out.push_str("  </url>\n");
}

fn render_index(base: &str, children: &[&str], today: &str) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    let _ = writeln!(out, r#"<sitemapindex xmlns="{}">"#, SITEMAP_NS);
    for child in children {
        out.push_str("  <sitemap>\n");
        let _ = writeln!(out, "    <loc>{}/{}</loc>", escape(base), child);
        let _ = writeln!(out, "    <lastmod>{}</lastmod>", today);
        out.push_str("  </sitemap>\n");
    }
    out.push_str("</sitemapindex>\n");
    out
}
