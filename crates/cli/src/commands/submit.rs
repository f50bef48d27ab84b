use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use muv_seo_core::{BlogPost, Clock, Settings};
use muv_seo_generator::sitemap::{
    BLOG_SITEMAP, INDEX_SITEMAP, MAIN_SITEMAP, NEWS_SITEMAP, eligible_posts, news_posts,
};
use muv_seo_submitter::{
    IndexNowSubmitter, JobReport, JobStatus, OAuthCredentials, PingSubmitter, PlannedJob,
    SearchConsoleSubmitter, SubmissionController, SubmissionLedger, Submitter, content_digest,
    http_client,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use super::Context;

type Plan = Vec<PlannedJob>;

pub async fn run(ctx: &Context, urls: Vec<String>, force: bool) -> Result<()> {
    // Posts only feed IndexNow
    let posts = if ctx.settings.indexnow.is_some() {
        ctx.fetch_posts().await?
    } else {
        Vec::new()
    };
    submit(ctx, &posts, urls, force).await
}

/// Build the submission plan, run it through the ledger and print outcomes.
///
/// Failed requests are reported but never turn into an error.
pub async fn submit(
    ctx: &Context,
    posts: &[BlogPost],
    extra_urls: Vec<String>,
    force: bool,
) -> Result<()> {
    println!("📣 Submitting to search engines...");

    let output = ctx.output_dir(None);
    let client = http_client().context("Failed to build HTTP client")?;
    let plan = build_plan(
        &ctx.settings,
        client,
        OAuthCredentials::from_env(),
        ctx.clock.clone(),
        sitemap_digest(&output),
        indexnow_urls(&ctx.settings, posts, ctx.now(), &extra_urls),
    );

    let ledger_dir = output;
    let ledger = SubmissionLedger::load(&ledger_dir).context("Failed to load submission ledger")?;
    let mut controller = SubmissionController::new(ledger, ctx.clock.clone()).force(force);
    let reports = controller.run(plan).await?;

    print_reports(&reports);
    Ok(())
}

/// Absolute URLs of the sitemaps search engines are told about.
pub fn sitemap_urls(settings: &Settings) -> Vec<String> {
    [INDEX_SITEMAP, NEWS_SITEMAP]
        .iter()
        .map(|file| settings.site.absolute_url(file))
        .collect()
}

/// Digest of the generated sitemap documents in `dir`, so a regenerated
/// sitemap is pinged again even though its URL is unchanged.
pub fn sitemap_digest(dir: &Path) -> Option<String> {
    let documents: Vec<String> = [INDEX_SITEMAP, MAIN_SITEMAP, BLOG_SITEMAP, NEWS_SITEMAP]
        .iter()
        .filter_map(|file| fs::read_to_string(dir.join(file)).ok())
        .collect();
    if documents.is_empty() {
        return None;
    }
    Some(content_digest(documents.iter().map(String::as_str)))
}

/// Blog posts inside the news window plus any explicitly requested URLs.
///
/// Site-relative extras are made absolute; URLs on another host are dropped
/// because IndexNow rejects the whole batch for them.
pub fn indexnow_urls(
    settings: &Settings,
    posts: &[BlogPost],
    now: DateTime<Utc>,
    extra: &[String],
) -> Vec<String> {
    let eligible = eligible_posts(posts);
    let recent = news_posts(&eligible, now, settings.news.window());

    let base = settings.site.base_url.as_str();
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    let candidates = recent
        .iter()
        .filter_map(|post| post.slug())
        .map(|slug| format!("{}/blog/{}", base, slug))
        .chain(extra.iter().filter_map(|url| {
            if url.starts_with('/') {
                Some(settings.site.absolute_url(url))
            } else if url == base || url.starts_with(&format!("{}/", base)) {
                Some(url.clone())
            } else {
                warn!(url = %url, "ignoring URL outside {}", base);
                None
            }
        }));

    for url in candidates {
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    urls
}

fn build_plan(
    settings: &Settings,
    client: reqwest::Client,
    credentials: Option<OAuthCredentials>,
    clock: Arc<dyn Clock>,
    sitemap_digest: Option<String>,
    indexnow_urls: Vec<String>,
) -> Plan {
    let sitemaps = sitemap_urls(settings);
    let google: Arc<dyn Submitter> = Arc::new(PingSubmitter::google(client.clone()));
    let bing: Arc<dyn Submitter> = Arc::new(PingSubmitter::bing(client.clone()));
    let mut sitemap_targets = vec![google, bing];

    if let Some(credentials) = credentials {
        sitemap_targets.push(Arc::new(SearchConsoleSubmitter::new(
            client.clone(),
            credentials,
            &settings.site.base_url,
            clock,
        )));
    }

    let mut plan: Plan = sitemap_targets
        .into_iter()
        .map(|submitter| {
            PlannedJob::new(submitter, sitemaps.clone())
                .with_content_digest(sitemap_digest.clone())
        })
        .collect();

    if let Some(config) = &settings.indexnow {
        let indexnow = IndexNowSubmitter::new(client, &settings.site, config);
        plan.push(PlannedJob::new(Arc::new(indexnow), indexnow_urls));
    }

    plan
}

fn print_reports(reports: &[JobReport]) {
    let mut failures = 0;
    for report in reports {
        match &report.status {
            JobStatus::Skipped => println!(
                "   ⏭ {}: already submitted in the last 24h (--force to resend)",
                report.target
            ),
            JobStatus::Empty => println!("   - {}: nothing to submit", report.target),
            JobStatus::Completed(outcomes) => {
                for outcome in outcomes {
                    let (mark, sep) = if outcome.ok { ("✓", " ") } else { ("⚠", ": ") };
                    if !outcome.ok {
                        failures += 1;
                    }
                    println!(
                        "   {} {} {}{}{}",
                        mark, outcome.target, outcome.subject, sep, outcome.detail
                    );
                }
            }
        }
    }
    if failures > 0 {
        println!("\n   {} request(s) failed; they will be retried on the next run", failures);
    }
}
