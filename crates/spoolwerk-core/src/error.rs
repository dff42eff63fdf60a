// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error types for Spoolwerk.
//
// Two families: `SpoolError` is returned synchronously to whoever called an
// operation (submission, registry admin, startup).  `DispatchError` never
// leaves the scheduler; it is recorded on the job as its `error` string.

use std::time::Duration;

use thiserror::Error;

use crate::types::PrinterKind;

/// Errors surfaced to callers of spooler operations.
#[derive(Debug, Error)]
pub enum SpoolError {
    // -- Submission --
    #[error("no enabled printer named '{0}'")]
    PrinterUnavailable(String),

    #[error("no enabled {0} printer configured")]
    NoDefaultPrinter(PrinterKind),

    #[error("network printer '{0}' has no network address")]
    MissingNetworkAddress(String),

    #[error("printer '{printer}' is a {kind} printer and cannot print {content} content")]
    ContentMismatch {
        printer: String,
        kind: PrinterKind,
        content: &'static str,
    },

    #[error("copies must be at least 1, got {0}")]
    InvalidCopies(u32),

    // -- Registry --
    #[error("printer '{0}' not found")]
    PrinterNotFound(String),

    #[error("printer '{0}' already exists")]
    DuplicatePrinter(String),

    #[error("invalid printer configuration: {0}")]
    InvalidPrinter(String),

    // -- Engine / startup --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolError>;

/// Why a single job's dispatch failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{kind} printer cannot print {content} content")]
    ContentMismatch {
        kind: PrinterKind,
        content: &'static str,
    },

    #[error("network printer '{0}' has no network address")]
    MissingNetworkAddress(String),

    #[error("printer '{0}' is no longer configured or enabled")]
    PrinterGone(String),

    #[error("no dispatch strategy registered for {0} printers")]
    NoStrategy(PrinterKind),

    #[error("could not prepare print file: {0}")]
    Artifact(#[source] std::io::Error),

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("printer responded with HTTP {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("network request failed: {0}")]
    Transport(String),

    #[error("dispatch timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("dispatch aborted unexpectedly: {0}")]
    Panicked(String),
}

/// Outcome of one dispatch: success, or failure with a reason.
pub type DispatchResult = std::result::Result<(), DispatchError>;
