use anyhow::{Context as _, Result};
use muv_seo_generator::{PrerenderReport, prerender_routes};
use std::fs;
use std::path::{Path, PathBuf};

use super::Context;

pub async fn run(ctx: &Context, template: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let Some(template_path) = template.or_else(|| ctx.settings.paths.template.clone()) else {
        anyhow::bail!("No template given\nPass --template or set paths.template in the config");
    };
    let output = ctx.output_dir(output);

    println!("📄 Prerendering routes...");
    println!("   Template: {}", template_path.display());

    let template = read_template(&template_path)?;
    let routes = ctx.load_routes()?;
    let report = prerender_routes(&template, &routes, &ctx.settings.site, &output);
    finish(&report)
}

pub fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read template {}", path.display()))
}

/// Print the outcome and turn any route failure into an error.
pub fn finish(report: &PrerenderReport) -> Result<()> {
    for failure in &report.failures {
        eprintln!("   ✗ {}: {}", failure.path, failure.error);
    }
    println!("   {}", report.summary());

    if !report.is_success() {
        anyhow::bail!("{} route(s) failed to prerender", report.failures.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use muv_seo_generator::prerender::RouteFailure;

    #[test]
    fn test_finish_fails_on_route_failure() {
        let mut report = PrerenderReport {
            total: 2,
            ..Default::default()
        };
        report.written.push(PathBuf::from("dist/index.html"));
        assert!(finish(&report).is_ok());

        report.failures.push(RouteFailure {
            path: "/servizi".to_string(),
            error: "template has no <!-- Default SEO --> block".to_string(),
        });
        let err = finish(&report).unwrap_err();
        assert_eq!(err.to_string(), "1 route(s) failed to prerender");
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let err = read_template(Path::new("/nonexistent/index.html")).unwrap_err();
        assert!(err.to_string().contains("Failed to read template"));
    }
}
