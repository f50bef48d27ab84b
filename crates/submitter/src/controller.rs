//! Runs submission jobs with idempotency keys.
//!
//! Jobs are independent, so they are awaited together. A job whose key is
//! already in the ledger within the dedupe window is skipped unless forced.
//! Only jobs where every request succeeded are recorded, so a failed ping
//! is attempted again on the next run.

use crate::ledger::{SubmissionJob, SubmissionLedger};
use crate::{SubmissionOutcome, Submitter};
use anyhow::Result;
use futures::future::join_all;
use muv_seo_core::Clock;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Same key completed recently
    Skipped,
    /// Nothing to submit
    Empty,
    Completed(Vec<SubmissionOutcome>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub target: &'static str,
    pub key: String,
    pub status: JobStatus,
}

impl JobReport {
    pub fn all_ok(&self) -> bool {
        match &self.status {
            JobStatus::Completed(outcomes) => outcomes.iter().all(|o| o.ok),
            JobStatus::Skipped | JobStatus::Empty => true,
        }
    }
}

/// A submitter, the URLs to hand it and optionally a digest of their content
pub struct PlannedJob {
    pub submitter: Arc<dyn Submitter>,
    pub urls: Vec<String>,
    pub content_digest: Option<String>,
}

impl PlannedJob {
    pub fn new(submitter: Arc<dyn Submitter>, urls: Vec<String>) -> Self {
        Self {
            submitter,
            urls,
            content_digest: None,
        }
    }

    /// Resubmit when the content changes even though the URLs do not.
    pub fn with_content_digest(mut self, digest: Option<String>) -> Self {
        self.content_digest = digest;
        self
    }

    fn into_job(self) -> (Arc<dyn Submitter>, SubmissionJob) {
        let mut job = SubmissionJob::new(self.submitter.name(), self.urls);
        job.content_digest = self.content_digest;
        (self.submitter, job)
    }
}

pub struct SubmissionController<C: Clock> {
    ledger: SubmissionLedger,
    clock: C,
    force: bool,
    dedupe_window: chrono::Duration,
}

impl<C: Clock> SubmissionController<C> {
    pub fn new(ledger: SubmissionLedger, clock: C) -> Self {
        Self {
            ledger,
            clock,
            force: false,
            dedupe_window: chrono::Duration::hours(24),
        }
    }

    /// Ignore the ledger when deciding whether to run a job.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn dedupe_window(mut self, window: chrono::Duration) -> Self {
        self.dedupe_window = window;
        self
    }

    pub fn ledger(&self) -> &SubmissionLedger {
        &self.ledger
    }

    /// Run every planned job and persist the ledger.
    pub async fn run(&mut self, plan: Vec<PlannedJob>) -> Result<Vec<JobReport>> {
        let now = self.clock.now();
        let mut reports: Vec<Option<JobReport>> = Vec::with_capacity(plan.len());
        let mut pending = Vec::new();

        for planned in plan {
            let (submitter, job) = planned.into_job();
            let key = job.idempotency_key();

            if job.urls.is_empty() {
                reports.push(Some(JobReport {
                    target: job.target,
                    key,
                    status: JobStatus::Empty,
                }));
                continue;
            }
            if !self.force && self.ledger.is_recent(&key, now, self.dedupe_window) {
                info!(target_name = job.target, %key, "skipping already submitted job");
                reports.push(Some(JobReport {
                    target: job.target,
                    key,
                    status: JobStatus::Skipped,
                }));
                continue;
            }

            reports.push(None);
            pending.push((reports.len() - 1, submitter, job));
        }

        let results = join_all(pending.into_iter().map(|(slot, submitter, job)| async move {
            let outcomes = submitter.submit(&job.urls).await;
            (slot, job, outcomes)
        }))
        .await;

        for (slot, job, outcomes) in results {
            if outcomes.iter().all(|o| o.ok) {
                self.ledger.record(&job, now);
            }
            reports[slot] = Some(JobReport {
                target: job.target,
                key: job.idempotency_key(),
                status: JobStatus::Completed(outcomes),
            });
        }

        self.ledger.save(now)?;
        Ok(reports.into_iter().flatten().collect())
    }
}
