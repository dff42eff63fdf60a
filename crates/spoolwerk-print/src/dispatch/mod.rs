// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dispatch strategies: one per printer kind, looked up from a table.
//
// A strategy turns a job into one concrete I/O operation (a local print
// command or an HTTP request) and reports the result as a `DispatchResult`.
// Strategies never touch the job store; the scheduler owns status changes.

mod artifact;
pub(crate) mod command;
pub mod network;
pub mod page;
pub mod thermal;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use spoolwerk_core::config::SpoolerConfig;
use spoolwerk_core::error::{DispatchResult, Result};
use spoolwerk_core::types::{PrintJob, PrinterConfig, PrinterKind};

pub use network::NetworkStrategy;
pub use page::PageStrategy;
pub use thermal::ThermalStrategy;

/// Backend-specific procedure that prints one job on one printer.
#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    async fn dispatch(&self, printer: &PrinterConfig, job: &PrintJob) -> DispatchResult;
}

/// Lookup table from printer kind to its strategy.
#[derive(Clone, Default)]
pub struct StrategyTable {
    strategies: HashMap<PrinterKind, Arc<dyn DispatchStrategy>>,
}

impl StrategyTable {
    /// An empty table.  Kinds without a strategy fail at dispatch time.
    pub fn new() -> Self {
        Self::default()
    }

    /// The production table: local print commands for thermal and page
    /// printers, HTTP for network printers.
    pub fn platform(config: &SpoolerConfig) -> Result<Self> {
        let thermal = Arc::new(ThermalStrategy::new(&config.commands));
        let page = Arc::new(PageStrategy::new(&config.commands, thermal.clone()));
        let network = Arc::new(NetworkStrategy::new(config.dispatch_timeout())?);

        Ok(Self::new()
            .with(PrinterKind::Thermal, thermal)
            .with(PrinterKind::Page, page)
            .with(PrinterKind::Network, network))
    }

    /// Register (or replace) the strategy for `kind`.
    pub fn with(mut self, kind: PrinterKind, strategy: Arc<dyn DispatchStrategy>) -> Self {
        self.strategies.insert(kind, strategy);
        self
    }

    pub fn get(&self, kind: PrinterKind) -> Option<Arc<dyn DispatchStrategy>> {
        self.strategies.get(&kind).cloned()
    }
}

impl std::fmt::Debug for StrategyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.strategies.keys()).finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process strategies for exercising the scheduler.

    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::{Notify, Semaphore};

    use spoolwerk_core::error::DispatchError;
    use spoolwerk_core::types::JobId;

    use super::*;

    /// Records every job it sees; fails jobs whose printer is in `failing`.
    #[derive(Default)]
    pub struct RecordingStrategy {
        pub seen: Mutex<Vec<JobId>>,
        pub failing: Vec<String>,
    }

    impl RecordingStrategy {
        pub fn failing_on(printer: &str) -> Self {
            Self {
                failing: vec![printer.to_string()],
                ..Default::default()
            }
        }

        pub fn seen(&self) -> Vec<JobId> {
            self.seen.lock().expect("seen lock").clone()
        }
    }

    #[async_trait]
    impl DispatchStrategy for RecordingStrategy {
        async fn dispatch(&self, printer: &PrinterConfig, job: &PrintJob) -> DispatchResult {
            self.seen.lock().expect("seen lock").push(job.id);
            if self.failing.contains(&printer.name) {
                return Err(DispatchError::CommandFailed {
                    program: "lp".into(),
                    status: "exit status: 1".into(),
                    stderr: "printer on fire".into(),
                });
            }
            Ok(())
        }
    }

    /// Parks every dispatch until a permit is released.
    pub struct GatedStrategy {
        pub started: Notify,
        pub gate: Semaphore,
    }

    impl GatedStrategy {
        pub fn new() -> Self {
            Self {
                started: Notify::new(),
                gate: Semaphore::new(0),
            }
        }

        pub fn release(&self, jobs: usize) {
            self.gate.add_permits(jobs);
        }
    }

    #[async_trait]
    impl DispatchStrategy for GatedStrategy {
        async fn dispatch(&self, _printer: &PrinterConfig, _job: &PrintJob) -> DispatchResult {
            self.started.notify_one();
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| DispatchError::Panicked(e.to_string()))?;
            permit.forget();
            Ok(())
        }
    }

    /// Write an executable shell script standing in for the print program.
    /// `$last` holds the path of the spooled file when `body` runs.
    #[cfg(unix)]
    pub fn print_script(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-lp");
        let script = format!("#!/bin/sh\nfor last in \"$@\"; do :; done\n{body}\n");
        std::fs::write(&path, script).expect("write print script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod print script");
        path.to_string_lossy().into_owned()
    }

    /// Never finishes within any sane timeout.
    pub struct StalledStrategy;

    #[async_trait]
    impl DispatchStrategy for StalledStrategy {
        async fn dispatch(&self, _printer: &PrinterConfig, _job: &PrintJob) -> DispatchResult {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    /// Panics mid-dispatch.
    pub struct PanickingStrategy;

    #[async_trait]
    impl DispatchStrategy for PanickingStrategy {
        async fn dispatch(&self, _printer: &PrinterConfig, _job: &PrintJob) -> DispatchResult {
            panic!("driver exploded");
        }
    }
}
