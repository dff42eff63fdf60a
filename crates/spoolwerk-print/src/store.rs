// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory print job store.
//
// Jobs are appended on submission and mutated in place as they move through
// `Pending -> Printing -> Completed | Failed`.  They are never deleted one by
// one; the retention sweep drops terminal jobs once they are old enough.
// Nothing here survives a restart.
//
// Every status change goes through `transition`, which checks the state
// machine under the store lock.  That is what makes `cancel` safe against a
// drain that has just picked the same job up.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use spoolwerk_core::error::DispatchResult;
use spoolwerk_core::types::{
    CANCELLED_BY_USER, JobContent, JobId, JobPriority, JobStatus, PrintJob,
};

/// Process-lifetime job store.
#[derive(Debug, Default)]
pub struct JobStore {
    /// Jobs in submission order.
    jobs: Mutex<Vec<PrintJob>>,
    next_sequence: AtomicU64,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new `Pending` job.  The caller has already resolved and
    /// checked the target printer.
    #[instrument(skip(self, content), fields(printer = %printer_name, bytes = content.len()))]
    pub fn enqueue(
        &self,
        content: JobContent,
        printer_name: String,
        copies: u32,
        priority: JobPriority,
    ) -> PrintJob {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let digest = content_digest(&content);
        let job = PrintJob::new(sequence, content, digest, printer_name, copies, priority);

        self.jobs
            .lock()
            .expect("job store lock poisoned")
            .push(job.clone());

        info!(job_id = %job.id, priority = ?job.priority, "job queued");
        job
    }

    pub fn get(&self, id: &JobId) -> Option<PrintJob> {
        let jobs = self.jobs.lock().expect("job store lock poisoned");
        jobs.iter().find(|j| j.id == *id).cloned()
    }

    /// Snapshot of every job, oldest submission first.
    pub fn list(&self) -> Vec<PrintJob> {
        self.jobs.lock().expect("job store lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("job store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the pending jobs in the order a drain must process them.
    pub fn pending_in_drain_order(&self) -> Vec<PrintJob> {
        let mut pending: Vec<PrintJob> = {
            let jobs = self.jobs.lock().expect("job store lock poisoned");
            jobs.iter()
                .filter(|j| j.status == JobStatus::Pending)
                .cloned()
                .collect()
        };
        order_for_drain(&mut pending);
        pending
    }

    /// Move a job from `Pending` to `Printing`.
    ///
    /// Returns the job as it now stands, or `None` if it is no longer pending
    /// (cancelled since the drain took its snapshot, or swept).
    pub fn begin(&self, id: &JobId) -> Option<PrintJob> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs.iter_mut().find(|j| j.id == *id)?;
        if transition(job, JobStatus::Printing) {
            Some(job.clone())
        } else {
            None
        }
    }

    /// Record the outcome of a dispatch on a `Printing` job.
    ///
    /// Returns the resulting status, or `None` if the job was not printing.
    pub fn finish(&self, id: &JobId, outcome: &DispatchResult) -> Option<JobStatus> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs.iter_mut().find(|j| j.id == *id)?;

        let next = match outcome {
            Ok(()) => JobStatus::Completed,
            Err(_) => JobStatus::Failed,
        };
        if !transition(job, next) {
            warn!(
                job_id = %id,
                status = ?job.status,
                "ignoring outcome for job that is not printing"
            );
            return None;
        }
        if let Err(e) = outcome {
            job.error = Some(e.to_string());
        }
        Some(next)
    }

    /// Cancel a job if, and only if, it is still pending.
    #[instrument(skip(self), fields(job_id = %id))]
    pub fn cancel(&self, id: &JobId) -> bool {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let Some(job) = jobs.iter_mut().find(|j| j.id == *id) else {
            debug!("cancel requested for unknown job");
            return false;
        };
        if job.status != JobStatus::Pending {
            debug!(status = ?job.status, "job already started; not cancelling");
            return false;
        }
        transition(job, JobStatus::Failed);
        job.error = Some(CANCELLED_BY_USER.to_string());
        info!("job cancelled");
        true
    }

    /// Drop terminal jobs whose `completed_at` is more than `retention` before
    /// `now`.  Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let before = jobs.len();
        jobs.retain(|job| !is_expired(job, now, retention));
        let swept = before - jobs.len();
        if swept > 0 {
            debug!(swept, remaining = jobs.len(), "retention sweep removed jobs");
        }
        swept
    }
}

/// Sort jobs highest priority first, then oldest first.
pub fn order_for_drain(jobs: &mut [PrintJob]) {
    jobs.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.sequence.cmp(&b.sequence))
    });
}

/// SHA-256 of the payload, lowercase hex.
pub fn content_digest(content: &JobContent) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Apply `next` if the state machine allows it.  Sets `completed_at` on
/// entry into a terminal state.
fn transition(job: &mut PrintJob, next: JobStatus) -> bool {
    if !job.status.can_transition_to(next) {
        return false;
    }
    job.status = next;
    if next.is_terminal() {
        job.completed_at = Some(Utc::now());
    }
    true
}

fn is_expired(job: &PrintJob, now: DateTime<Utc>, retention: Duration) -> bool {
    if !job.status.is_terminal() {
        return false;
    }
    match job.completed_at {
        // A negative age (clock skew) fails `to_std` and keeps the job.
        Some(done) => now
            .signed_duration_since(done)
            .to_std()
            .map(|age| age > retention)
            .unwrap_or(false),
        None => false,
    }
}
