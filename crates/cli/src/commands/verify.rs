use anyhow::Result;
use muv_seo_validator::{count_prerendered_pages, verify_output_dir};
use std::path::{Path, PathBuf};

use super::{Context, print_report};

pub async fn run(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let output = ctx.output_dir(output);
    check(&output)
}

pub fn check(output: &Path) -> Result<()> {
    println!("🔍 Verifying {}", output.display());

    let report = verify_output_dir(output);
    print_report(&report);

    let pages = count_prerendered_pages(output);
    if pages > 0 {
        println!("   ✓ {} prerendered pages", pages);
    }

    if !report.all_passed() {
        anyhow::bail!("Verification failed: {}", report.summary());
    }
    Ok(())
}
