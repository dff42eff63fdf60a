// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory and config file resolution.

use std::path::PathBuf;

pub const CONFIG_ENV: &str = "SPOOLWERK_CONFIG";
const CONFIG_FILE: &str = "config.json";

/// Where to read the spooler config from.
///
/// An explicit CLI argument wins, then `SPOOLWERK_CONFIG`, then
/// `config.json` inside the data directory.  `env` is the environment
/// lookup, normally `std::env::var`.
pub fn config_path(arg: Option<String>, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = arg.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(path) = env(CONFIG_ENV).filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    data_dir(&env).join(CONFIG_FILE)
}

/// The application data directory.  Not created here; a missing config
/// file is not an error.
pub fn data_dir(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    base_dir(env).join("spoolwerk")
}

fn base_dir(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    // XDG data dir, then ~/.local/share
    if let Some(xdg) = env("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Some(home) = env("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
