pub mod generate;
pub mod health;
pub mod init;
pub mod pipeline;
pub mod prerender;
pub mod serve;
pub mod submit;
pub mod verify;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use muv_seo_core::types::flexible_datetime;
use muv_seo_core::{BlogPost, Clock, FixedClock, RouteDescriptor, Settings, SystemClock};
use muv_seo_generator::source::source_from_settings;
use muv_seo_validator::ValidationReport;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings plus the time source shared by every command
pub struct Context {
    pub settings: Settings,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub fn load(config_path: &Path, now: Option<&str>) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "{} not found\nRun 'muv-seo init <dir>' first or pass --config",
                config_path.display()
            );
        }
        let settings = muv_seo_core::parse_config(config_path)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let clock: Arc<dyn Clock> = match now {
            Some(raw) => {
                let instant = flexible_datetime::parse(raw)
                    .with_context(|| format!("Invalid --now value '{}'", raw))?;
                Arc::new(FixedClock(instant))
            }
            None => Arc::new(SystemClock),
        };

        Ok(Self { settings, clock })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn output_dir(&self, override_dir: Option<PathBuf>) -> PathBuf {
        override_dir.unwrap_or_else(|| self.settings.paths.output.clone())
    }

    pub fn load_routes(&self) -> Result<Vec<RouteDescriptor>> {
        muv_seo_core::parse_route_registry(&self.settings.paths.routes)
            .context("Failed to load route registry")
    }

    pub async fn fetch_posts(&self) -> Result<Vec<BlogPost>> {
        let source = source_from_settings(&self.settings)?;
        source
            .fetch_posts()
            .await
            .with_context(|| format!("Failed to fetch posts from {}", source.describe()))
    }
}

/// Print a validation report in the usual ✓/✗ layout.
pub fn print_report(report: &ValidationReport) {
    for result in &report.results {
        let mark = if result.passed { "✓" } else { "✗" };
        match result.url_count {
            Some(count) if result.passed => {
                println!("   {} {} ({} URLs)", mark, result.name, count)
            }
            _ => println!("   {} {}: {}", mark, result.name, result.detail),
        }
    }
    for warning in &report.warnings {
        println!("   ⚠ {}", warning);
    }
    println!();
    println!("   {}", report.summary());
}
