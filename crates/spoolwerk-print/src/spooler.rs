// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spooler facade: the operations the rest of the back office calls.
//
// Owns one printer registry, one job store, the scheduler that drains the
// store, and the status probe.  Construct once per process and share it
// behind an `Arc`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use spoolwerk_core::config::SpoolerConfig;
use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::types::{
    JobContent, JobId, JobPriority, JobRequest, PrintJob, PrinterConfig, PrinterKind,
    PrinterStatus, PrinterUpdate,
};

use crate::dispatch::StrategyTable;
use crate::probe::StatusProbe;
use crate::registry::PrinterRegistry;
use crate::scheduler::{DrainReport, Scheduler};
use crate::store::JobStore;

pub struct Spooler {
    registry: Arc<PrinterRegistry>,
    store: Arc<JobStore>,
    scheduler: Arc<Scheduler>,
    probe: StatusProbe,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

impl Spooler {
    /// Build a spooler with the platform dispatch strategies.
    pub fn new(config: SpoolerConfig) -> Result<Self> {
        let strategies = StrategyTable::platform(&config)?;
        Self::with_strategies(config, strategies)
    }

    /// Build a spooler with a caller-supplied strategy table.
    pub fn with_strategies(config: SpoolerConfig, strategies: StrategyTable) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(PrinterRegistry::with_printers(config.printers.iter().cloned())?);
        let store = Arc::new(JobStore::new());
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            Arc::new(strategies),
            config.retention(),
            config.dispatch_timeout(),
        ));
        let probe = StatusProbe::new(&config.commands, config.probe_timeout())?;

        info!(printers = config.printers.len(), "spooler initialised");
        Ok(Self {
            registry,
            store,
            scheduler,
            probe,
            tick_interval: config.tick_interval(),
            shutdown: Arc::new(Notify::new()),
            loop_task: Mutex::new(None),
        })
    }

    // -- Printers ------------------------------------------------------------

    pub fn list_printers(&self, enabled_only: bool) -> Vec<PrinterConfig> {
        self.registry.list(enabled_only)
    }

    pub fn get_printer(&self, name: &str) -> Option<PrinterConfig> {
        self.registry.get(name)
    }

    pub fn add_printer(&self, printer: PrinterConfig) -> Result<()> {
        self.registry.add(printer)
    }

    pub fn update_printer(&self, name: &str, update: &PrinterUpdate) -> Result<PrinterConfig> {
        self.registry.update(name, update)
    }

    pub fn remove_printer(&self, name: &str) -> Result<PrinterConfig> {
        self.registry.remove(name)
    }

    // -- Jobs ----------------------------------------------------------------

    /// Queue a job.
    ///
    /// Every configuration problem is reported here, before anything is
    /// queued: unknown or disabled printer, no default printer for the
    /// content, network printer without an address, binary content for a
    /// thermal printer, zero copies.
    #[instrument(
        skip_all,
        fields(printer = ?request.printer_name, content = request.content.label())
    )]
    pub fn submit_job(&self, request: JobRequest) -> Result<PrintJob> {
        let copies = request.copies.unwrap_or(1);
        if copies == 0 {
            return Err(SpoolError::InvalidCopies(copies));
        }

        let printer = match request.printer_name {
            Some(name) => self
                .registry
                .get(&name)
                .filter(|p| p.enabled)
                .ok_or(SpoolError::PrinterUnavailable(name))?,
            None => {
                let kind = request.content.default_printer_kind();
                self.registry
                    .list(true)
                    .into_iter()
                    .find(|p| p.kind == kind)
                    .ok_or(SpoolError::NoDefaultPrinter(kind))?
            }
        };
        check_compatible(&printer, &request.content)?;

        let job = self.store.enqueue(
            request.content,
            printer.name,
            copies,
            request.priority.unwrap_or(JobPriority::Normal),
        );
        Ok(job)
    }

    /// Snapshot of every job still held (pending, printing, or recently
    /// finished).
    pub fn list_queue(&self) -> Vec<PrintJob> {
        self.store.list()
    }

    pub fn get_job(&self, id: &JobId) -> Option<PrintJob> {
        self.store.get(id)
    }

    /// Cancel a pending job.  Returns `false` if it has already started,
    /// finished, or does not exist.
    pub fn cancel_job(&self, id: &JobId) -> bool {
        self.store.cancel(id)
    }

    // -- Status --------------------------------------------------------------

    /// Advisory reachability check.  Unknown printers read as offline.
    pub async fn probe_status(&self, name: &str) -> PrinterStatus {
        match self.registry.get(name) {
            Some(printer) => self.probe.probe(&printer).await,
            None => {
                debug!(printer = name, "probe for unknown printer");
                PrinterStatus::OFFLINE
            }
        }
    }

    // -- Scheduling ----------------------------------------------------------

    /// Drain the queue once, now.  A no-op if a drain is already running.
    pub async fn tick(&self) -> DrainReport {
        self.scheduler.tick().await
    }

    /// Start the periodic scheduler loop.  Must be called from within a
    /// Tokio runtime.  Calling it again while running does nothing.
    pub fn start(&self) {
        let mut task = self.loop_task.lock().expect("loop task lock poisoned");
        if task.is_some() {
            debug!("scheduler already running");
            return;
        }

        let scheduler = Arc::clone(&self.scheduler);
        let shutdown = Arc::clone(&self.shutdown);
        *task = Some(tokio::spawn(scheduler.run(self.tick_interval, shutdown)));
    }

    pub fn is_running(&self) -> bool {
        self.loop_task
            .lock()
            .expect("loop task lock poisoned")
            .is_some()
    }

    /// Stop the loop and wait for any in-flight drain to finish.
    pub async fn stop(&self) -> Result<()> {
        let task = self.loop_task.lock().expect("loop task lock poisoned").take();
        let Some(task) = task else {
            return Ok(());
        };

        self.shutdown.notify_one();
        task.await
            .map_err(|e| SpoolError::Scheduler(format!("loop task join: {e}")))?;
        self.scheduler.wait_idle().await;

        info!("spooler stopped");
        Ok(())
    }
}

impl Drop for Spooler {
    fn drop(&mut self) {
        let task = match self.loop_task.get_mut() {
            Ok(task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            warn!("spooler dropped while running; aborting scheduler loop");
            task.abort();
        }
    }
}

/// Submission-time printer/content checks.
fn check_compatible(printer: &PrinterConfig, content: &JobContent) -> Result<()> {
    match (printer.kind, content) {
        (PrinterKind::Network, _) if printer.address().is_none() => {
            Err(SpoolError::MissingNetworkAddress(printer.name.clone()))
        }
        (PrinterKind::Thermal, JobContent::Binary(_)) => Err(SpoolError::ContentMismatch {
            printer: printer.name.clone(),
            kind: printer.kind,
            content: content.label(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::NetworkStrategy;
    use crate::dispatch::testing::{GatedStrategy, RecordingStrategy};
    use spoolwerk_core::types::{CANCELLED_BY_USER, JobStatus};

    fn config() -> SpoolerConfig {
        let mut disabled = PrinterConfig::thermal("Back", 58);
        disabled.enabled = false;
        SpoolerConfig {
            printers: vec![
                PrinterConfig::thermal("Front", 80),
                disabled,
                PrinterConfig::page("Office"),
            ],
            ..Default::default()
        }
    }

    fn recording_spooler() -> (Spooler, Arc<RecordingStrategy>) {
        let recorder = Arc::new(RecordingStrategy::default());
        let table = StrategyTable::new()
            .with(PrinterKind::Thermal, recorder.clone())
            .with(PrinterKind::Page, recorder.clone());
        let spooler = Spooler::with_strategies(config(), table).expect("spooler");
        (spooler, recorder)
    }

    #[tokio::test]
    async fn mixed_priorities_drain_high_normal_low() {
        let (spooler, recorder) = recording_spooler();
        let low = spooler
            .submit_job(JobRequest::text("low").printer("Front").priority(JobPriority::Low))
            .expect("low");
        let high = spooler
            .submit_job(JobRequest::text("high").printer("Front").priority(JobPriority::High))
            .expect("high");
        let normal = spooler
            .submit_job(JobRequest::text("normal").printer("Front"))
            .expect("normal");
        assert_eq!(normal.priority, JobPriority::Normal);
        assert_eq!(normal.copies, 1);

        spooler.tick().await;
        assert_eq!(recorder.seen(), vec![high.id, normal.id, low.id]);
    }

    #[tokio::test]
    async fn unreachable_network_printer_fails_and_queue_moves_on() {
        let recorder = Arc::new(RecordingStrategy::default());
        let network = NetworkStrategy::new(Duration::from_secs(5)).expect("client");
        let table = StrategyTable::new()
            .with(PrinterKind::Thermal, recorder.clone())
            .with(PrinterKind::Network, Arc::new(network));
        let spooler = Spooler::with_strategies(config(), table).expect("spooler");
        spooler
            .add_printer(PrinterConfig::network("Bar", "http://127.0.0.1:1/print"))
            .expect("add");

        let remote = spooler
            .submit_job(JobRequest::text("drinks").printer("Bar"))
            .expect("network job");
        let local = spooler
            .submit_job(JobRequest::text("receipt").printer("Front"))
            .expect("thermal job");

        let report = spooler.tick().await;
        assert_eq!(report.dispatched, vec![remote.id, local.id]);

        let remote = spooler.get_job(&remote.id).expect("job");
        assert_eq!(remote.status, JobStatus::Failed);
        assert!(remote.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert!(remote.completed_at.is_some());
        assert_eq!(spooler.get_job(&local.id).map(|j| j.status), Some(JobStatus::Completed));
    }

    #[tokio::test]
    async fn cancelled_job_is_never_dispatched() {
        let (spooler, recorder) = recording_spooler();
        let job = spooler.submit_job(JobRequest::text("void")).expect("submit");

        assert!(spooler.cancel_job(&job.id));
        spooler.tick().await;

        let job = spooler.get_job(&job.id).expect("job");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some(CANCELLED_BY_USER));
        assert!(recorder.seen().is_empty());
        assert!(!spooler.cancel_job(&job.id));
    }

    #[test]
    fn unknown_or_disabled_printer_is_rejected_before_queueing() {
        let (spooler, _) = recording_spooler();
        let before = spooler.list_queue().len();

        let unknown = spooler.submit_job(JobRequest::text("x").printer("Nowhere"));
        assert!(matches!(unknown, Err(SpoolError::PrinterUnavailable(name)) if name == "Nowhere"));

        let disabled = spooler.submit_job(JobRequest::text("x").printer("Back"));
        assert!(matches!(disabled, Err(SpoolError::PrinterUnavailable(_))));

        assert_eq!(spooler.list_queue().len(), before);
    }

    #[test]
    fn default_printer_follows_content_kind() {
        let (spooler, _) = recording_spooler();

        let text = spooler.submit_job(JobRequest::text("receipt")).expect("text");
        assert_eq!(text.printer_name, "Front");

        let binary = spooler
            .submit_job(JobRequest::binary(b"%PDF-1.4".to_vec()))
            .expect("binary");
        assert_eq!(binary.printer_name, "Office");
    }

    #[test]
    fn default_printer_skips_disabled_entries() {
        let (spooler, _) = recording_spooler();
        spooler
            .update_printer(
                "Front",
                &PrinterUpdate {
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .expect("disable");

        let result = spooler.submit_job(JobRequest::text("receipt"));
        assert!(matches!(
            result,
            Err(SpoolError::NoDefaultPrinter(PrinterKind::Thermal))
        ));
        assert!(spooler.list_queue().is_empty());
        assert_eq!(spooler.list_printers(true).len(), 1);
    }

    #[test]
    fn submission_guards_reject_bad_combinations() {
        let (spooler, _) = recording_spooler();
        spooler
            .add_printer(PrinterConfig::network("Bar", " "))
            .expect("add");

        assert!(matches!(
            spooler.submit_job(JobRequest::text("x").printer("Bar")),
            Err(SpoolError::MissingNetworkAddress(_))
        ));
        assert!(matches!(
            spooler.submit_job(JobRequest::binary(vec![0x1b]).printer("Front")),
            Err(SpoolError::ContentMismatch { .. })
        ));
        assert!(matches!(
            spooler.submit_job(JobRequest::text("x").copies(0)),
            Err(SpoolError::InvalidCopies(0))
        ));
        assert!(spooler.list_queue().is_empty());

        // Text to a page printer is allowed.
        assert!(spooler.submit_job(JobRequest::text("x").printer("Office")).is_ok());
    }

    #[test]
    fn list_queue_returns_a_snapshot() {
        let (spooler, _) = recording_spooler();
        let job = spooler.submit_job(JobRequest::text("x")).expect("submit");

        let mut queue = spooler.list_queue();
        queue[0].status = JobStatus::Completed;
        queue.clear();

        assert_eq!(spooler.list_queue().len(), 1);
        assert_eq!(spooler.get_job(&job.id).map(|j| j.status), Some(JobStatus::Pending));
        assert!(spooler.get_job(&JobId::new()).is_none());
    }

    #[tokio::test]
    async fn probe_of_unknown_printer_is_offline() {
        let (spooler, _) = recording_spooler();
        assert_eq!(spooler.probe_status("Nowhere").await, PrinterStatus::OFFLINE);
    }

    #[tokio::test]
    async fn start_drains_in_background_and_stop_waits() {
        let gated = Arc::new(GatedStrategy::new());
        let table = StrategyTable::new().with(PrinterKind::Thermal, gated.clone());
        let spooler = Spooler::with_strategies(
            SpoolerConfig {
                tick_interval_ms: 10,
                ..config()
            },
            table,
        )
        .expect("spooler");

        let job = spooler.submit_job(JobRequest::text("x")).expect("submit");
        spooler.start();
        spooler.start();
        assert!(spooler.is_running());

        gated.started.notified().await;
        gated.release(1);
        spooler.stop().await.expect("stop");
        assert!(!spooler.is_running());

        assert_eq!(spooler.get_job(&job.id).map(|j| j.status), Some(JobStatus::Completed));
        spooler.stop().await.expect("second stop is a no-op");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn nothing_is_dispatched_after_stop_returns() {
        let (spooler, recorder) = {
            let recorder = Arc::new(RecordingStrategy::default());
            let table = StrategyTable::new().with(PrinterKind::Thermal, recorder.clone());
            let config = SpoolerConfig {
                tick_interval_ms: 1,
                ..config()
            };
            (Spooler::with_strategies(config, table).expect("spooler"), recorder)
        };

        for _ in 0..100 {
            spooler.start();
            tokio::time::sleep(Duration::from_millis(3)).await;
            spooler.stop().await.expect("stop");

            let job = spooler.submit_job(JobRequest::text("late")).expect("submit");
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(spooler.get_job(&job.id).map(|j| j.status), Some(JobStatus::Pending));
            assert!(!recorder.seen().contains(&job.id));

            assert!(spooler.cancel_job(&job.id));
        }
    }

    #[test]
    fn printer_changes_are_visible_through_the_facade() {
        let (spooler, _) = recording_spooler();
        spooler
            .add_printer(PrinterConfig::thermal("Bar", 58))
            .expect("add");
        assert_eq!(spooler.get_printer("Bar").map(|p| p.width_mm), Some(58));

        let updated = spooler
            .update_printer(
                "Bar",
                &PrinterUpdate {
                    width_mm: Some(80),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.width_mm, 80);
        assert_eq!(spooler.get_printer("Bar").map(|p| p.width_mm), Some(80));

        spooler.remove_printer("Bar").expect("remove");
        assert!(spooler.get_printer("Bar").is_none());
        assert!(spooler.get_printer("Back").is_some_and(|p| !p.enabled));
    }
}
