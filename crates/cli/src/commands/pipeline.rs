use anyhow::Result;

use super::generate::Artifacts;
use super::{Context, prerender, submit, verify};

/// generate → prerender → verify → submit, stopping at the first failure.
pub async fn run(ctx: &Context, with_submit: bool, force: bool) -> Result<()> {
    let output = ctx.output_dir(None);

    let (posts, routes, template) = tokio::try_join!(
        ctx.fetch_posts(),
        async { ctx.load_routes() },
        async {
            ctx.settings
                .paths
                .template
                .as_deref()
                .map(prerender::read_template)
                .transpose()
        },
    )?;
    println!("✓ Loaded {} routes, {} posts", routes.len(), posts.len());

    println!("\n🗺  Generating sitemaps...");
    let artifacts = Artifacts::render(&ctx.settings, &routes, &posts, ctx.now());
    artifacts.write_to(&output)?;
    artifacts.print_summary(&output);

    match &template {
        Some(template) => {
            println!("\n📄 Prerendering routes...");
            let report =
                muv_seo_generator::prerender_routes(template, &routes, &ctx.settings.site, &output);
            prerender::finish(&report)?;
        }
        None => println!("\n⚠ No paths.template configured, skipping prerender"),
    }

    println!();
    verify::check(&output)?;

    if with_submit {
        println!();
        submit::submit(ctx, &posts, Vec::new(), force).await?;
    }

    println!("\n✓ Done");
    Ok(())
}
