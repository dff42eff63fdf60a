// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Print: printer registry, in-memory job store, dispatch
// strategies, and the periodic scheduler that drains the store.  The
// `Spooler` facade ties them together for the host binary.

pub mod dispatch;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod spooler;
pub mod store;

pub use dispatch::{DispatchStrategy, StrategyTable};
pub use probe::StatusProbe;
pub use registry::PrinterRegistry;
pub use scheduler::{DrainReport, Scheduler};
pub use spooler::Spooler;
pub use store::JobStore;
