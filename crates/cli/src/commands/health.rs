use anyhow::{Context as _, Result};
use muv_seo_validator::health::http_client;
use muv_seo_validator::{check_targets, default_targets};

use super::{Context, print_report};

pub async fn run(ctx: &Context, base_url: Option<String>) -> Result<()> {
    let base_url = base_url.unwrap_or_else(|| ctx.settings.site.base_url.clone());
    check(&base_url).await
}

pub async fn check(base_url: &str) -> Result<()> {
    println!("🩺 Checking {}", base_url);

    let client = http_client().context("Failed to build HTTP client")?;
    let report = check_targets(&client, &default_targets(base_url)).await;
    print_report(&report);

    if !report.all_passed() {
        anyhow::bail!("Health check failed: {}", report.summary());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::serve::{AppState, router};
    use muv_seo_core::config::parse_config_str;
    use muv_seo_core::{FixedClock, RouteDescriptor};
    use muv_seo_generator::JsonFileSource;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_live_endpoint_passes_health_check() {
        let dir = TempDir::new().unwrap();
        let routes_path = dir.path().join("routes.json");
        let posts_path = dir.path().join("posts.json");
        std::fs::write(&posts_path, "[]").unwrap();
        let routes = vec![RouteDescriptor {
            path: "/".to_string(),
            title: "MUV Fitness".to_string(),
            description: "Palestra a Legnago".to_string(),
            keywords: None,
            priority: 1.0,
            changefreq: muv_seo_core::ChangeFreq::Daily,
            lastmod: None,
            og_image: None,
        }];
        std::fs::write(&routes_path, serde_json::to_string(&routes).unwrap()).unwrap();

        let mut settings = parse_config_str("", Path::new(".")).unwrap();
        settings.paths.routes = routes_path;

        let state = AppState {
            settings: Arc::new(settings),
            source: Arc::new(JsonFileSource::new(posts_path)),
            clock: Arc::new(FixedClock(chrono::Utc::now())),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        check(&format!("http://{}", addr)).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_site_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = check(&format!("http://{}", addr)).await.unwrap_err();
        assert_eq!(err.to_string(), "Health check failed: 0/5 checks passed");
    }
}
