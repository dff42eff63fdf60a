// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Spoolwerk print spooler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SpoolError;

/// Error text recorded on a job cancelled while still pending.
pub const CANCELLED_BY_USER: &str = "cancelled by user";

// ---------------------------------------------------------------------------
// Printers
// ---------------------------------------------------------------------------

/// Output device families.  Each family has exactly one dispatch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterKind {
    /// Receipt printer fed plain text.
    Thermal,
    /// Laser/inkjet printer fed rendered documents.
    #[serde(alias = "laser", alias = "inkjet")]
    Page,
    /// Printer reachable over HTTP.
    Network,
}

impl std::fmt::Display for PrinterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Thermal => "thermal",
            Self::Page => "page",
            Self::Network => "network",
        })
    }
}

/// A configured output device.  `name` is both the display name and the
/// registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PrinterKind,
    pub width_mm: u32,
    #[serde(default)]
    pub height_mm: Option<u32>,
    /// Base URL (or `host:port`) for network printers.
    #[serde(default)]
    pub network_address: Option<String>,
    #[serde(default)]
    pub driver_hint: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl PrinterConfig {
    /// An enabled receipt printer of the given paper width.
    pub fn thermal(name: impl Into<String>, width_mm: u32) -> Self {
        Self::with_kind(name, PrinterKind::Thermal, width_mm)
    }

    /// An enabled A4 page printer.
    pub fn page(name: impl Into<String>) -> Self {
        let mut printer = Self::with_kind(name, PrinterKind::Page, 210);
        printer.height_mm = Some(297);
        printer
    }

    /// An enabled 80 mm network printer at `address`.
    pub fn network(name: impl Into<String>, address: impl Into<String>) -> Self {
        let mut printer = Self::with_kind(name, PrinterKind::Network, 80);
        printer.network_address = Some(address.into());
        printer
    }

    fn with_kind(name: impl Into<String>, kind: PrinterKind, width_mm: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            width_mm,
            height_mm: None,
            network_address: None,
            driver_hint: None,
            enabled: true,
        }
    }

    /// The network address, if set and not blank.
    pub fn address(&self) -> Option<&str> {
        self.network_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Structural checks applied when a printer enters the registry.
    ///
    /// A network printer without an address is deliberately *not* rejected
    /// here; that is only an error once a job targets it.
    pub fn validate(&self) -> Result<(), SpoolError> {
        if self.name.trim().is_empty() {
            return Err(SpoolError::InvalidPrinter("name must not be empty".into()));
        }
        if self.width_mm == 0 {
            return Err(SpoolError::InvalidPrinter(format!(
                "'{}': width_mm must be greater than zero",
                self.name
            )));
        }
        if self.height_mm == Some(0) {
            return Err(SpoolError::InvalidPrinter(format!(
                "'{}': height_mm must be greater than zero",
                self.name
            )));
        }
        Ok(())
    }
}

/// Partial update for a registered printer.  `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterUpdate {
    #[serde(rename = "type")]
    pub kind: Option<PrinterKind>,
    pub width_mm: Option<u32>,
    pub height_mm: Option<u32>,
    pub network_address: Option<String>,
    pub driver_hint: Option<String>,
    pub enabled: Option<bool>,
}

impl PrinterUpdate {
    /// Merge this update into `printer`.
    pub fn apply_to(&self, printer: &mut PrinterConfig) {
        if let Some(kind) = self.kind {
            printer.kind = kind;
        }
        if let Some(width) = self.width_mm {
            printer.width_mm = width;
        }
        if let Some(height) = self.height_mm {
            printer.height_mm = Some(height);
        }
        if let Some(ref address) = self.network_address {
            printer.network_address = Some(address.clone());
        }
        if let Some(ref hint) = self.driver_hint {
            printer.driver_hint = Some(hint.clone());
        }
        if let Some(enabled) = self.enabled {
            printer.enabled = enabled;
        }
    }
}

/// Result of a reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrinterStatus {
    pub online: bool,
}

impl PrinterStatus {
    pub const OFFLINE: Self = Self { online: false };
    pub const ONLINE: Self = Self { online: true };
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Printable payload.  The spooler forwards it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum JobContent {
    Text(String),
    Binary(Vec<u8>),
}

impl JobContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Short label used in errors and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }

    /// Printer family picked when the caller names no printer.
    pub fn default_printer_kind(&self) -> PrinterKind {
        match self {
            Self::Text(_) => PrinterKind::Thermal,
            Self::Binary(_) => PrinterKind::Page,
        }
    }
}

/// Scheduling priority.  Variant order is significant: `Low < Normal < High`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Lifecycle states of a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued, waiting for the next drain.
    Pending,
    /// Handed to a dispatch strategy.
    Printing,
    /// Dispatch succeeded.
    Completed,
    /// Dispatch failed or the job was cancelled. See `error`.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine allows `self -> next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Printing)
                | (Self::Pending, Self::Failed)
                | (Self::Printing, Self::Completed)
                | (Self::Printing, Self::Failed)
        )
    }
}

/// A queued unit of printable work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: JobId,
    /// Process-unique submission counter; final ordering tie-break.
    pub sequence: u64,
    pub content: JobContent,
    /// SHA-256 of the payload, hex encoded.
    pub content_digest: String,
    pub printer_name: String,
    pub copies: u32,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl PrintJob {
    pub fn new(
        sequence: u64,
        content: JobContent,
        content_digest: String,
        printer_name: String,
        copies: u32,
        priority: JobPriority,
    ) -> Self {
        Self {
            id: JobId::new(),
            sequence,
            content,
            content_digest,
            printer_name,
            copies,
            priority,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// Arguments to `submit_job`.  Unset fields take their defaults.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub content: JobContent,
    pub printer_name: Option<String>,
    pub copies: Option<u32>,
    pub priority: Option<JobPriority>,
}

impl JobRequest {
    pub fn new(content: JobContent) -> Self {
        Self {
            content,
            printer_name: None,
            copies: None,
            priority: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(JobContent::Text(text.into()))
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(JobContent::Binary(bytes.into()))
    }

    pub fn printer(mut self, name: impl Into<String>) -> Self {
        self.printer_name = Some(name.into());
        self
    }

    pub fn copies(mut self, copies: u32) -> Self {
        self.copies = Some(copies);
        self
    }

    pub fn priority(mut self, priority: JobPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}
