// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk: Core types, error definitions, and configuration shared by the
// spooler engine and its host binary.

pub mod config;
pub mod error;
pub mod types;

pub use config::{PlatformCommands, SpoolerConfig};
pub use error::{DispatchError, DispatchResult, SpoolError};
pub use types::*;
