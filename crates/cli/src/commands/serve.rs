use anyhow::{Context as _, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use muv_seo_core::{Clock, Settings};
use muv_seo_generator::sitemap::{BLOG_SITEMAP, INDEX_SITEMAP, MAIN_SITEMAP, NEWS_SITEMAP};
use muv_seo_generator::source::source_from_settings;
use muv_seo_generator::{
    PostSource, SitemapOptions, SitemapSet, build_sitemaps, generate_robots_txt,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::Context;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub source: Arc<dyn PostSource>,
    pub clock: Arc<dyn Clock>,
}

/// Render failures, mapped to 502 when the post source is at fault
struct RenderError(muv_seo_core::Error);

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            muv_seo_core::Error::DataSource(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(%status, error = %self.0, "sitemap request failed");
        (status, [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], self.0.to_string()).into_response()
    }
}

/// Serve live sitemaps and robots.txt.
///
/// Every request re-reads the route registry and the post source, so the
/// documents always reflect the current data.
pub async fn run(ctx: Context, port: u16) -> Result<()> {
    println!("🚀 Starting sitemap server...");

    let source: Arc<dyn PostSource> = Arc::from(source_from_settings(&ctx.settings)?);
    println!("   ✓ Posts from {}", source.describe());

    let state = AppState {
        settings: Arc::new(ctx.settings),
        source,
        clock: ctx.clock,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("\n   Listening on http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/sitemap.xml",
            get(|state: State<AppState>| sitemap_handler(state, INDEX_SITEMAP)),
        )
        .route(
            "/sitemap-main.xml",
            get(|state: State<AppState>| sitemap_handler(state, MAIN_SITEMAP)),
        )
        .route(
            "/sitemap-blog.xml",
            get(|state: State<AppState>| sitemap_handler(state, BLOG_SITEMAP)),
        )
        .route(
            "/sitemap-news.xml",
            get(|state: State<AppState>| sitemap_handler(state, NEWS_SITEMAP)),
        )
        .route("/robots.txt", get(robots_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn render(state: &AppState) -> Result<SitemapSet, RenderError> {
    let routes =
        muv_seo_core::parse_route_registry(&state.settings.paths.routes).map_err(RenderError)?;
    let posts = state.source.fetch_posts().await.map_err(RenderError)?;
    let options = SitemapOptions::from_settings(&state.settings);
    Ok(build_sitemaps(&routes, &posts, state.clock.now(), &options))
}

async fn sitemap_handler(State(state): State<AppState>, file: &'static str) -> Response {
    let sitemaps = match render(&state).await {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };
    match sitemaps.get(file) {
        Some(body) => (
            [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
            body.to_string(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn robots_handler(State(state): State<AppState>) -> Response {
    let body = generate_robots_txt(&state.settings.site, &state.settings.robots);
    ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response()
}

async fn health_handler() -> &'static str {
    "ok"
}
