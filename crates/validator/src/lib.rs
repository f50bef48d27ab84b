//! Post-generation checks: local files on disk and the deployed site.

pub mod health;
pub mod verify;

pub use health::{HealthTarget, check_targets, default_targets};
pub use verify::{count_prerendered_pages, verify_output_dir};

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    /// File name or URL that was checked
    pub name: String,
    pub passed: bool,
    pub detail: String,
    /// `<loc>` count for sitemap documents
    pub url_count: Option<usize>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
            url_count: None,
        }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
            url_count: None,
        }
    }

    pub fn with_url_count(mut self, count: usize) -> Self {
        self.url_count = Some(count);
        self
    }
}

/// Aggregate of a verification run
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub results: Vec<CheckResult>,
    /// Non-fatal observations (e.g. an optional artifact is absent)
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Process exit code: 0 when every check passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    pub fn summary(&self) -> String {
        let passed = self.results.iter().filter(|r| r.passed).count();
        format!("{}/{} checks passed", passed, self.results.len())
    }
}
