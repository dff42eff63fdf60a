// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform print/status command invocation.
//
// Unix goes through the CUPS command-line tools (`lp`, `lpstat`).  Windows
// goes through PowerShell's printer cmdlets.  The program name comes from
// config so deployments can point at a wrapper script.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::debug;

use spoolwerk_core::error::{DispatchError, DispatchResult};
use spoolwerk_core::types::PrinterConfig;

/// Run `program` with `args` and capture its output.  The child is killed if
/// the returned future is dropped (e.g. on dispatch timeout).
pub(crate) async fn capture(program: &str, args: &[OsString]) -> std::io::Result<Output> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
}

/// Run a print command; a non-zero exit is a dispatch failure.
pub(crate) async fn run_command(program: &str, args: &[OsString]) -> DispatchResult {
    let output = capture(program, args)
        .await
        .map_err(|source| DispatchError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        debug!(program, "print command succeeded");
        return Ok(());
    }

    Err(DispatchError::CommandFailed {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Normalise a configured network address into a request URL.
/// Bare `host:port` addresses are treated as plain HTTP.
pub(crate) fn endpoint_url(address: &str) -> String {
    let address = address.trim();
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

/// Arguments that print the file at `path` on `printer`.
///
/// With `page_media`, the printer's configured paper size is requested too.
#[cfg(not(windows))]
pub(crate) fn print_args(
    printer: &PrinterConfig,
    copies: u32,
    path: &Path,
    page_media: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-d".into(),
        printer.name.clone().into(),
        "-n".into(),
        copies.to_string().into(),
    ];
    if let (true, Some(height)) = (page_media, printer.height_mm) {
        args.push("-o".into());
        args.push(format!("media=Custom.{}x{}mm", printer.width_mm, height).into());
    }
    args.push(path.as_os_str().to_owned());
    args
}

#[cfg(windows)]
pub(crate) fn print_args(
    printer: &PrinterConfig,
    copies: u32,
    path: &Path,
    page_media: bool,
) -> Vec<OsString> {
    let file = ps_quote(&path.to_string_lossy());
    let name = ps_quote(&printer.name);
    let print_one = if page_media {
        format!("Start-Process -FilePath {file} -Verb PrintTo -ArgumentList {name} -Wait")
    } else {
        format!("Get-Content -Raw -LiteralPath {file} | Out-Printer -Name {name}")
    };
    powershell(format!("1..{copies} | ForEach-Object {{ {print_one} }}"))
}

/// Arguments that report the state of the named local printer.
#[cfg(not(windows))]
pub(crate) fn status_args(name: &str) -> Vec<OsString> {
    vec!["-p".into(), name.into()]
}

#[cfg(windows)]
pub(crate) fn status_args(name: &str) -> Vec<OsString> {
    powershell(format!("(Get-Printer -Name {}).PrinterStatus", ps_quote(name)))
}

#[cfg(windows)]
fn powershell(script: String) -> Vec<OsString> {
    vec![
        "-NoProfile".into(),
        "-NonInteractive".into(),
        "-Command".into(),
        script.into(),
    ]
}

#[cfg(windows)]
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
