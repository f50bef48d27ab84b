//! robots.txt generation.

use crate::sitemap::{INDEX_SITEMAP, NEWS_SITEMAP};
use muv_seo_core::{RobotsConfig, SiteConfig};
use std::fmt::Write as _;

/// Paths no crawler should index.
pub const DEFAULT_DISALLOW: &[&str] = &["/admin/", "/auth/", "/api/", "/*?*utm_"];

/// AI training crawlers that are shut out of the whole site.
pub const AI_CRAWLERS: &[&str] = &[
    "GPTBot",
    "ChatGPT-User",
    "CCBot",
    "anthropic-ai",
    "Google-Extended",
];

/// Render robots.txt for the site.
///
/// The built-in disallow list and AI crawler blocks are always present;
/// `robots` only adds to them.
pub fn generate_robots_txt(site: &SiteConfig, robots: &RobotsConfig) -> String {
    let mut out = String::new();

    out.push_str("User-agent: *\n");
    out.push_str("Allow: /\n");
    let mut disallowed: Vec<&str> = DEFAULT_DISALLOW.to_vec();
    for extra in &robots.extra_disallow {
        if !disallowed.contains(&extra.as_str()) {
            disallowed.push(extra);
        }
    }
    for path in disallowed {
        let _ = writeln!(out, "Disallow: {}", path);
    }

    let mut agents: Vec<&str> = AI_CRAWLERS.to_vec();
    for extra in &robots.extra_blocked_agents {
        if !agents.iter().any(|a| a.eq_ignore_ascii_case(extra)) {
            agents.push(extra);
        }
    }
    for agent in agents {
        out.push('\n');
        let _ = writeln!(out, "User-agent: {}", agent);
        out.push_str("Disallow: /\n");
    }

    out.push('\n');
    let _ = writeln!(out, "Sitemap: {}", site.absolute_url(INDEX_SITEMAP));
    let _ = writeln!(out, "Sitemap: {}", site.absolute_url(NEWS_SITEMAP));

    out
}
