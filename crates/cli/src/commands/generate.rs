use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use muv_seo_core::{BlogPost, RouteDescriptor, Settings};
use muv_seo_generator::{SitemapOptions, SitemapSet, build_sitemaps, generate_robots_txt};
use std::fs;
use std::path::{Path, PathBuf};

use super::Context;

/// Everything `generate` puts on disk, rendered before anything is written
pub struct Artifacts {
    pub sitemaps: SitemapSet,
    pub robots: String,
    /// `(file name, contents)` of the IndexNow ownership file
    pub indexnow_key: Option<(String, String)>,
}

impl Artifacts {
    pub fn render(
        settings: &Settings,
        routes: &[RouteDescriptor],
        posts: &[BlogPost],
        now: DateTime<Utc>,
    ) -> Self {
        let options = SitemapOptions::from_settings(settings);
        Self {
            sitemaps: build_sitemaps(routes, posts, now, &options),
            robots: generate_robots_txt(&settings.site, &settings.robots),
            indexnow_key: settings
                .indexnow
                .as_ref()
                .map(|k| (k.key_file_name(), k.key.clone())),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = self
            .sitemaps
            .write_to(dir)
            .with_context(|| format!("Failed to write sitemaps to {}", dir.display()))?;

        let robots_path = dir.join("robots.txt");
        fs::write(&robots_path, &self.robots)
            .with_context(|| format!("Failed to write {}", robots_path.display()))?;
        written.push(robots_path);

        if let Some((name, key)) = &self.indexnow_key {
            let key_path = dir.join(name);
            fs::write(&key_path, key)
                .with_context(|| format!("Failed to write {}", key_path.display()))?;
            written.push(key_path);
        }

        Ok(written)
    }

    pub fn print_summary(&self, output: &Path) {
        println!("   ✓ sitemap-main.xml ({} URLs)", self.sitemaps.main_urls);
        println!("   ✓ sitemap-blog.xml ({} URLs)", self.sitemaps.blog_urls);
        if self.sitemaps.news_urls > 0 {
            println!("   ✓ sitemap-news.xml ({} URLs)", self.sitemaps.news_urls);
        } else {
            println!("   ⚠ sitemap-news.xml has no posts inside the news window");
        }
        println!("   ✓ sitemap.xml");
        println!("   ✓ robots.txt");
        if let Some((name, _)) = &self.indexnow_key {
            println!("   ✓ {}", name);
        }
        println!("   Output: {}", output.display());
    }
}

pub async fn run(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let output = ctx.output_dir(output);
    println!("🗺  Generating sitemaps...");

    let routes = ctx.load_routes()?;
    let posts = ctx.fetch_posts().await?;
    println!("   ✓ {} routes, {} posts", routes.len(), posts.len());

    let artifacts = Artifacts::render(&ctx.settings, &routes, &posts, ctx.now());
    artifacts.write_to(&output)?;
    artifacts.print_summary(&output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use muv_seo_core::config::parse_config_str;
    use muv_seo_core::{BlogPost, ChangeFreq, PostStatus};
    use tempfile::TempDir;

    fn settings(with_key: bool) -> Settings {
        let mut toml = String::from("[site]\nbase_url = \"https://www.muvfitness.it\"\n");
        if with_key {
            toml.push_str("[indexnow]\nkey = \"abcdef0123456789\"\n");
        }
        parse_config_str(&toml, Path::new(".")).unwrap()
    }

    fn routes() -> Vec<RouteDescriptor> {
        vec![RouteDescriptor {
            path: "/".to_string(),
            title: "MUV Fitness Legnago".to_string(),
            description: "Palestra a Legnago".to_string(),
            keywords: None,
            priority: 1.0,
            changefreq: ChangeFreq::Weekly,
            lastmod: None,
            og_image: None,
        }]
    }

    fn posts() -> Vec<BlogPost> {
        vec![BlogPost {
            slug: Some("ems-training".to_string()),
            title: "EMS Training".to_string(),
            published_at: flexible("2024-01-09T10:00:00Z"),
            updated_at: None,
            status: PostStatus::Published,
            meta_keywords: None,
        }]
    }

    fn flexible(s: &str) -> Option<DateTime<Utc>> {
        muv_seo_core::types::flexible_datetime::parse(s)
    }

    #[test]
    fn test_writes_every_artifact() {
        let dir = TempDir::new().unwrap();
        let now = flexible("2024-01-10T12:00:00Z").unwrap();
        let artifacts = Artifacts::render(&settings(true), &routes(), &posts(), now);
        let written = artifacts.write_to(dir.path()).unwrap();

        assert_eq!(written.len(), 6);
        for name in [
            "sitemap.xml",
            "sitemap-main.xml",
            "sitemap-blog.xml",
            "sitemap-news.xml",
            "robots.txt",
        ] {
            assert!(dir.path().join(name).exists(), "{} missing", name);
        }
        let key = fs::read_to_string(dir.path().join("abcdef0123456789.txt")).unwrap();
        assert_eq!(key, "abcdef0123456789");
    }

    #[test]
    fn test_no_key_file_without_indexnow() {
        let dir = TempDir::new().unwrap();
        let now = flexible("2024-01-10T12:00:00Z").unwrap();
        let artifacts = Artifacts::render(&settings(false), &routes(), &posts(), now);
        let written = artifacts.write_to(dir.path()).unwrap();
        assert_eq!(written.len(), 5);
        assert!(artifacts.indexnow_key.is_none());
    }

    #[test]
    fn test_generated_output_passes_verification() {
        let dir = TempDir::new().unwrap();
        let now = flexible("2024-01-10T12:00:00Z").unwrap();
        Artifacts::render(&settings(false), &routes(), &posts(), now)
            .write_to(dir.path())
            .unwrap();

        let report = muv_seo_validator::verify_output_dir(dir.path());
        assert!(report.all_passed(), "{:?}", report.results);
    }
}
