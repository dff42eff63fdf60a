// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page (laser/inkjet) printer strategy.
//
// Binary documents are written to a temp file and sent with the platform
// document print command.  Text is handed to the text strategy unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use spoolwerk_core::config::PlatformCommands;
use spoolwerk_core::error::DispatchResult;
use spoolwerk_core::types::{JobContent, PrintJob, PrinterConfig};

use super::DispatchStrategy;
use super::artifact::{TransientArtifact, document_suffix};
use super::command::{print_args, run_command};

pub struct PageStrategy {
    print_program: String,
    text_fallback: Arc<dyn DispatchStrategy>,
}

impl PageStrategy {
    /// `text_fallback` prints text jobs; normally the thermal strategy.
    pub fn new(commands: &PlatformCommands, text_fallback: Arc<dyn DispatchStrategy>) -> Self {
        Self {
            print_program: commands.print_program.clone(),
            text_fallback,
        }
    }
}

#[async_trait]
impl DispatchStrategy for PageStrategy {
    #[instrument(skip_all, fields(job_id = %job.id, printer = %printer.name))]
    async fn dispatch(&self, printer: &PrinterConfig, job: &PrintJob) -> DispatchResult {
        let bytes = match job.content {
            JobContent::Binary(ref bytes) => bytes,
            JobContent::Text(_) => {
                debug!("text job on page printer; using text strategy");
                return self.text_fallback.dispatch(printer, job).await;
            }
        };

        if let Some(ref hint) = printer.driver_hint {
            debug!(driver = %hint, "printing with driver hint");
        }

        let artifact = TransientArtifact::write(bytes, document_suffix(bytes))?;
        let args = print_args(printer, job.copies, artifact.path(), true);
        let outcome = run_command(&self.print_program, &args).await;
        artifact.discard();
        outcome?;

        info!(copies = job.copies, bytes = bytes.len(), "document sent to page printer");
        Ok(())
    }
}
