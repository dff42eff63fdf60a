// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scheduler loop: drains the job store on a fixed tick.
//
// A drain snapshots every pending job, orders it (priority, then age), and
// dispatches the jobs strictly one after another.  Drains never overlap: the
// drain lock is taken with `try_lock`, so a tick that lands while a previous
// drain is still running does nothing.
//
// Each dispatch runs in its own task under a timeout.  A strategy that
// errors, panics, or hangs fails only its own job; the drain carries on.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use spoolwerk_core::error::{DispatchError, DispatchResult};
use spoolwerk_core::types::{JobId, JobStatus, PrintJob};

use crate::dispatch::StrategyTable;
use crate::registry::PrinterRegistry;
use crate::store::JobStore;

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// The tick found a drain already running and did nothing.
    pub skipped: bool,
    /// Jobs moved to `Printing` by this drain, in dispatch order.
    pub dispatched: Vec<JobId>,
    pub completed: usize,
    pub failed: usize,
    /// Terminal jobs removed by the retention sweep.
    pub swept: usize,
}

impl DrainReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

pub struct Scheduler {
    registry: Arc<PrinterRegistry>,
    store: Arc<JobStore>,
    strategies: Arc<StrategyTable>,
    retention: Duration,
    dispatch_timeout: Duration,
    drain_lock: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        registry: Arc<PrinterRegistry>,
        store: Arc<JobStore>,
        strategies: Arc<StrategyTable>,
        retention: Duration,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            strategies,
            retention,
            dispatch_timeout,
            drain_lock: Mutex::new(()),
        }
    }

    /// Run one drain, unless one is already in progress.
    pub async fn tick(&self) -> DrainReport {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            debug!("previous drain still running; skipping tick");
            return DrainReport::skipped();
        };

        let mut report = DrainReport::default();
        let queue = self.store.pending_in_drain_order();
        if !queue.is_empty() {
            debug!(pending = queue.len(), "draining print queue");
        }

        for queued in queue {
            // Re-check under the store lock: the job may have been cancelled
            // since the snapshot.
            let Some(job) = self.store.begin(&queued.id) else {
                debug!(job_id = %queued.id, "job left pending before dispatch; skipping");
                continue;
            };
            report.dispatched.push(job.id);

            let id = job.id;
            let outcome = self.dispatch(job).await;
            match self.store.finish(&id, &outcome) {
                Some(JobStatus::Completed) => {
                    info!(job_id = %id, "job completed");
                    report.completed += 1;
                }
                Some(_) => {
                    if let Err(ref e) = outcome {
                        warn!(job_id = %id, error = %e, "job failed");
                    }
                    report.failed += 1;
                }
                None => {}
            }
        }

        report.swept = self.store.sweep(Utc::now(), self.retention);
        report
    }

    /// Resolve the job's printer and strategy, then run the strategy in its
    /// own task under the dispatch timeout.
    async fn dispatch(&self, job: PrintJob) -> DispatchResult {
        let printer = self
            .registry
            .get(&job.printer_name)
            .filter(|p| p.enabled)
            .ok_or_else(|| DispatchError::PrinterGone(job.printer_name.clone()))?;
        let strategy = self
            .strategies
            .get(printer.kind)
            .ok_or(DispatchError::NoStrategy(printer.kind))?;

        debug!(job_id = %job.id, printer = %printer.name, kind = %printer.kind, "dispatching job");
        let mut task = tokio::spawn(async move { strategy.dispatch(&printer, &job).await });

        match tokio::time::timeout(self.dispatch_timeout, &mut task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Err(DispatchError::Panicked(panic_message(join_error))),
            Err(_) => {
                task.abort();
                Err(DispatchError::TimedOut(self.dispatch_timeout))
            }
        }
    }

    /// Wait until no drain is running.
    pub async fn wait_idle(&self) {
        let _guard = self.drain_lock.lock().await;
    }

    /// Tick every `period` until `shutdown` is notified.
    ///
    /// Drains run inline on this task, so once the loop returns no drain
    /// started by it is still running.  Ticks missed during a long drain
    /// are skipped, not replayed.
    pub async fn run(self: Arc<Self>, period: Duration, shutdown: Arc<Notify>) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "scheduler loop started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.notified() => {
                    debug!("scheduler loop received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("scheduler loop stopped");
    }
}

fn panic_message(error: tokio::task::JoinError) -> String {
    if error.is_cancelled() {
        return "dispatch task was cancelled".into();
    }
    let payload = error.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "strategy panicked".into()
    }
}
