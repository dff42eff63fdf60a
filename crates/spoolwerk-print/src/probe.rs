// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-demand printer reachability probe.
//
// Advisory only: the scheduler never consults it.  Every failure (missing
// tool, timeout, unparseable output, refused connection) reads as offline.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};

use spoolwerk_core::config::PlatformCommands;
use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::types::{PrinterConfig, PrinterKind, PrinterStatus};

use crate::dispatch::command::{capture, endpoint_url, status_args};

#[derive(Debug, Error)]
enum ProbeError {
    #[error("status command failed to run: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("status command exited with {0}")]
    Exit(String),
    #[error("no network address configured")]
    NoAddress,
    #[error("HTTP probe failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("probe timed out")]
    TimedOut,
}

pub struct StatusProbe {
    status_program: String,
    http: Client,
    timeout: Duration,
}

impl StatusProbe {
    pub fn new(commands: &PlatformCommands, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpoolError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            status_program: commands.status_program.clone(),
            http,
            timeout,
        })
    }

    /// Whether `printer` currently looks reachable.  Never fails.
    #[instrument(skip_all, fields(printer = %printer.name, kind = %printer.kind))]
    pub async fn probe(&self, printer: &PrinterConfig) -> PrinterStatus {
        let outcome = tokio::time::timeout(self.timeout, self.query(printer))
            .await
            .unwrap_or(Err(ProbeError::TimedOut));

        match outcome {
            Ok(true) => {
                debug!("probe finished; printer online");
                PrinterStatus::ONLINE
            }
            Ok(false) => {
                debug!("probe finished; printer reports it is not ready");
                PrinterStatus::OFFLINE
            }
            Err(e) => {
                debug!(error = %e, "probe failed; reporting offline");
                PrinterStatus::OFFLINE
            }
        }
    }

    async fn query(&self, printer: &PrinterConfig) -> std::result::Result<bool, ProbeError> {
        match printer.kind {
            PrinterKind::Network => {
                let address = printer.address().ok_or(ProbeError::NoAddress)?;
                // Any HTTP answer at all means the device is up.
                self.http.get(endpoint_url(address)).send().await?;
                Ok(true)
            }
            PrinterKind::Thermal | PrinterKind::Page => {
                let output = capture(&self.status_program, &status_args(&printer.name)).await?;
                if !output.status.success() {
                    return Err(ProbeError::Exit(output.status.to_string()));
                }
                Ok(parse_status_output(
                    &printer.name,
                    &String::from_utf8_lossy(&output.stdout),
                ))
            }
        }
    }
}

/// Interpret `lpstat -p` / `Get-Printer` output for the printer `name`.
///
/// `lpstat` prints e.g. "printer Front is idle.  enabled since ..." or
/// "printer Front disabled since ...".  Only the state words after
/// "printer <name> " are read, so the printer or job name cannot change
/// the answer.  PowerShell prints a bare status word such as `Normal` or
/// `Offline`.
pub fn parse_status_output(name: &str, output: &str) -> bool {
    let prefix = format!("printer {name} ");
    if let Some(state) = output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(prefix.as_str()))
    {
        let state = state.trim_start().to_ascii_lowercase();
        return state.starts_with("is idle") || state.starts_with("now printing");
    }

    output.trim().eq_ignore_ascii_case("normal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe(status_program: &str) -> StatusProbe {
        let commands = PlatformCommands {
            status_program: status_program.into(),
            ..Default::default()
        };
        StatusProbe::new(&commands, Duration::from_secs(2)).expect("probe")
    }

    #[test]
    fn lpstat_idle_and_printing_are_online() {
        assert!(parse_status_output(
            "Front",
            "printer Front is idle.  enabled since Tue 14 Oct 2026 09:12:01"
        ));
        assert!(parse_status_output(
            "Front",
            "printer Front now printing Front-42.  enabled since Tue 14 Oct 2026"
        ));
        assert!(parse_status_output("Front", "Normal\r\n"));
    }

    #[test]
    fn lpstat_disabled_and_garbage_are_offline() {
        assert!(!parse_status_output(
            "Front",
            "printer Front disabled since Tue 14 Oct 2026 -\n\treason unknown"
        ));
        assert!(!parse_status_output("Front", "Offline"));
        assert!(!parse_status_output("Front", ""));
        assert!(!parse_status_output("Front", "lpstat: Invalid destination name"));
    }

    #[test]
    fn printer_and_job_names_do_not_affect_state() {
        assert!(parse_status_output(
            "Offline-Bar",
            "printer Offline-Bar is idle.  enabled since Tue 14 Oct 2026"
        ));
        assert!(parse_status_output(
            "Error-Desk",
            "printer Error-Desk now printing Error-Desk-7.  enabled since Tue 14 Oct 2026"
        ));
        assert!(!parse_status_output(
            "Enabled-Till",
            "printer Enabled-Till disabled since Tue 14 Oct 2026"
        ));
        // Another queue whose name merely starts with ours.
        assert!(!parse_status_output("Front", "printer Frontdesk is idle."));
    }

    #[tokio::test]
    async fn missing_status_tool_reads_offline() {
        let status = probe("spoolwerk-no-such-program")
            .probe(&PrinterConfig::thermal("Front", 80))
            .await;
        assert_eq!(status, PrinterStatus::OFFLINE);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_status_tool_reads_offline() {
        let status = probe("false").probe(&PrinterConfig::page("Office")).await;
        assert!(!status.online);
    }

    #[tokio::test]
    async fn network_printer_answering_http_is_online() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let status = probe("lpstat")
            .probe(&PrinterConfig::network("Bar", server.uri()))
            .await;
        assert_eq!(status, PrinterStatus::ONLINE);
    }

    #[tokio::test]
    async fn unreachable_or_unaddressed_network_printer_is_offline() {
        let probe = probe("lpstat");
        assert!(!probe.probe(&PrinterConfig::network("Bar", "127.0.0.1:1")).await.online);
        assert!(!probe.probe(&PrinterConfig::network("Bar", "")).await.online);
    }
}
