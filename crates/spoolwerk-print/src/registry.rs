// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory printer registry keyed by printer name.
//
// Insertion order is preserved so that "first enabled printer of a kind" is
// stable.  Concurrent admin updates to the same name are last-writer-wins.

use std::sync::Mutex;

use tracing::{debug, info, instrument};

use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::types::{PrinterConfig, PrinterUpdate};

/// The set of configured output devices.
#[derive(Debug, Default)]
pub struct PrinterRegistry {
    printers: Mutex<Vec<PrinterConfig>>,
}

impl PrinterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the static printer list in the config file.
    pub fn with_printers(printers: impl IntoIterator<Item = PrinterConfig>) -> Result<Self> {
        let registry = Self::new();
        for printer in printers {
            registry.add(printer)?;
        }
        Ok(registry)
    }

    /// Snapshot of the registered printers, optionally hiding disabled ones.
    pub fn list(&self, enabled_only: bool) -> Vec<PrinterConfig> {
        let printers = self.printers.lock().expect("registry lock poisoned");
        printers
            .iter()
            .filter(|p| !enabled_only || p.enabled)
            .cloned()
            .collect()
    }

    /// Look up a printer by name.  Returns `None` for unknown names; there is
    /// no implicit default.
    pub fn get(&self, name: &str) -> Option<PrinterConfig> {
        let printers = self.printers.lock().expect("registry lock poisoned");
        printers.iter().find(|p| p.name == name).cloned()
    }

    #[instrument(skip(self, printer), fields(printer = %printer.name, kind = %printer.kind))]
    pub fn add(&self, printer: PrinterConfig) -> Result<()> {
        printer.validate()?;
        let mut printers = self.printers.lock().expect("registry lock poisoned");
        if printers.iter().any(|p| p.name == printer.name) {
            return Err(SpoolError::DuplicatePrinter(printer.name));
        }
        info!("printer registered");
        printers.push(printer);
        Ok(())
    }

    /// Apply a partial update and return the merged config.
    #[instrument(skip(self, update))]
    pub fn update(&self, name: &str, update: &PrinterUpdate) -> Result<PrinterConfig> {
        let mut printers = self.printers.lock().expect("registry lock poisoned");
        let slot = printers
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| SpoolError::PrinterNotFound(name.to_string()))?;

        let mut merged = slot.clone();
        update.apply_to(&mut merged);
        merged.validate()?;
        *slot = merged.clone();

        debug!(enabled = merged.enabled, kind = %merged.kind, "printer updated");
        Ok(merged)
    }

    #[instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<PrinterConfig> {
        let mut printers = self.printers.lock().expect("registry lock poisoned");
        let index = printers
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| SpoolError::PrinterNotFound(name.to_string()))?;
        info!("printer removed");
        Ok(printers.remove(index))
    }
}
