//! Submission jobs and the on-disk ledger of completed ones.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const LEDGER_FILE: &str = ".muv-seo-submissions.json";

/// Ledger entries older than this are dropped on save.
const RETENTION_DAYS: i64 = 30;

/// One target plus the URLs to hand it
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionJob {
    pub target: &'static str,
    pub urls: Vec<String>,
    /// Digest of what the URLs currently serve, for URLs whose address
    /// never changes (the sitemaps)
    pub content_digest: Option<String>,
}

/// SHA-256 over a sequence of documents, each length-prefixed.
pub fn content_digest<'a>(documents: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update((doc.len() as u64).to_le_bytes());
        hasher.update(doc.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

impl SubmissionJob {
    pub fn new(target: &'static str, urls: Vec<String>) -> Self {
        Self {
            target,
            urls,
            content_digest: None,
        }
    }

    pub fn with_content_digest(mut self, digest: impl Into<String>) -> Self {
        self.content_digest = Some(digest.into());
        self
    }

    /// SHA-256 over the target name, the sorted, de-duplicated URL list and
    /// the content digest when there is one.
    pub fn idempotency_key(&self) -> String {
        let mut urls: Vec<&str> = self.urls.iter().map(String::as_str).collect();
        urls.sort_unstable();
        urls.dedup();

        let mut hasher = Sha256::new();
        hasher.update(self.target.as_bytes());
        for url in urls {
            hasher.update(b"\n");
            hasher.update(url.as_bytes());
        }
        if let Some(digest) = &self.content_digest {
            hasher.update(b"\n#");
            hasher.update(digest.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub target: String,
    pub submitted_at: DateTime<Utc>,
    pub url_count: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    entries: BTreeMap<String, LedgerEntry>,
}

/// Completed jobs keyed by idempotency key
#[derive(Debug)]
pub struct SubmissionLedger {
    path: Option<PathBuf>,
    entries: BTreeMap<String, LedgerEntry>,
}

impl SubmissionLedger {
    /// A ledger that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Load `dir/.muv-seo-submissions.json`; a missing file is an empty ledger.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(LEDGER_FILE);
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file: LedgerFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            file.entries
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// Whether `key` completed within `window` before `now`.
    pub fn is_recent(&self, key: &str, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| now.signed_duration_since(e.submitted_at) < window)
    }

    pub fn record(&mut self, job: &SubmissionJob, now: DateTime<Utc>) {
        self.entries.insert(
            job.idempotency_key(),
            LedgerEntry {
                target: job.target.to_string(),
                submitted_at: now,
                url_count: job.urls.len(),
            },
        );
    }

    /// Drop expired entries and persist (no-op for in-memory ledgers).
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<()> {
        let cutoff = now - chrono::Duration::days(RETENTION_DAYS);
        self.entries.retain(|_, e| e.submitted_at >= cutoff);

        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = LedgerFile {
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file).context("Failed to serialize ledger")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn job(target: &'static str, urls: &[&str]) -> SubmissionJob {
        SubmissionJob::new(target, urls.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_key_ignores_order_and_duplicates() {
        let a = job("indexnow", &["https://x/a", "https://x/b"]);
        let b = job("indexnow", &["https://x/b", "https://x/a", "https://x/a"]);
        assert_eq!(a.idempotency_key(), b.idempotency_key());
        assert_eq!(a.idempotency_key().len(), 64);
    }

    #[test]
    fn test_key_depends_on_target_and_urls() {
        let base = job("google-ping", &["https://x/sitemap.xml"]);
        assert_ne!(
            base.idempotency_key(),
            job("bing-ping", &["https://x/sitemap.xml"]).idempotency_key()
        );
        assert_ne!(
            base.idempotency_key(),
            job("google-ping", &["https://x/sitemap-news.xml"]).idempotency_key()
        );
    }

    #[test]
    fn test_key_changes_with_content_digest() {
        let plain = job("google-ping", &["https://x/sitemap.xml"]);
        let before = plain.clone().with_content_digest(content_digest(["<urlset/>"]));
        let after = plain
            .clone()
            .with_content_digest(content_digest(["<urlset><url/></urlset>"]));

        assert_ne!(plain.idempotency_key(), before.idempotency_key());
        assert_ne!(before.idempotency_key(), after.idempotency_key());
        assert_eq!(
            before.idempotency_key(),
            plain
                .with_content_digest(content_digest(["<urlset/>"]))
                .idempotency_key()
        );
    }

    #[test]
    fn test_content_digest_separates_documents() {
        assert_ne!(content_digest(["ab", "c"]), content_digest(["a", "bc"]));
    }

    #[test]
    fn test_is_recent_window() {
        let mut ledger = SubmissionLedger::in_memory();
        let j = job("indexnow", &["https://x/a"]);
        let key = j.idempotency_key();
        ledger.record(&j, now());

        let day = chrono::Duration::hours(24);
        assert!(ledger.is_recent(&key, now() + chrono::Duration::hours(23), day));
        assert!(!ledger.is_recent(&key, now() + day, day));
        assert!(!ledger.is_recent("unknown", now(), day));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut ledger = SubmissionLedger::load(dir.path()).unwrap();
        assert!(ledger.is_empty());

        let j = job("google-ping", &["https://x/sitemap.xml"]);
        ledger.record(&j, now());
        ledger.save(now()).unwrap();

        let reloaded = SubmissionLedger::load(dir.path()).unwrap();
        let entry = reloaded.get(&j.idempotency_key()).unwrap();
        assert_eq!(entry.target, "google-ping");
        assert_eq!(entry.url_count, 1);
        assert_eq!(entry.submitted_at, now());
    }

    #[test]
    fn test_save_prunes_old_entries() {
        let mut ledger = SubmissionLedger::in_memory();
        ledger.record(&job("a", &["https://x/1"]), now() - chrono::Duration::days(31));
        ledger.record(&job("b", &["https://x/2"]), now() - chrono::Duration::days(1));
        ledger.save(now()).unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_corrupt_ledger_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LEDGER_FILE), "not json").unwrap();
        assert!(SubmissionLedger::load(dir.path()).is_err());
    }
}
