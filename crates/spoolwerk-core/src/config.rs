// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spooler configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpoolError};
use crate::types::PrinterConfig;

/// External programs used by the local dispatch strategies and the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformCommands {
    /// Submits a file to a named local printer (`lp` on Unix).
    pub print_program: String,
    /// Reports a named local printer's state (`lpstat` on Unix).
    pub status_program: String,
}

impl Default for PlatformCommands {
    #[cfg(windows)]
    fn default() -> Self {
        Self {
            print_program: "powershell".into(),
            status_program: "powershell".into(),
        }
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        Self {
            print_program: "lp".into(),
            status_program: "lpstat".into(),
        }
    }
}

/// Engine settings, loaded once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolerConfig {
    /// Scheduler tick period in milliseconds (default 1000).
    pub tick_interval_ms: u64,
    /// How long completed/failed jobs stay visible (default one hour).
    pub retention_secs: u64,
    /// Upper bound for a single dispatch before the job is failed.
    pub dispatch_timeout_secs: u64,
    /// Upper bound for a status probe.
    pub probe_timeout_secs: u64,
    pub commands: PlatformCommands,
    /// Printers seeded into the registry at start.
    pub printers: Vec<PrinterConfig>,
}

impl Default for SpoolerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            retention_secs: 3600,
            dispatch_timeout_secs: 60,
            probe_timeout_secs: 5,
            commands: PlatformCommands::default(),
            printers: Vec::new(),
        }
    }
}

impl SpoolerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Read a JSON config file.  A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SpoolError::Io(e)),
        };
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| SpoolError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(SpoolError::Config("tick_interval_ms must be greater than zero".into()));
        }
        if self.dispatch_timeout_secs == 0 {
            return Err(SpoolError::Config(
                "dispatch_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
