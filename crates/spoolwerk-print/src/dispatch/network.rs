// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Network printer strategy: POST the raw payload to the printer's HTTP
// endpoint, once per copy.  Anything but a 2xx is a failed dispatch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, info, instrument};

use spoolwerk_core::error::{DispatchError, DispatchResult, Result, SpoolError};
use spoolwerk_core::types::{JobContent, PrintJob, PrinterConfig};

use super::DispatchStrategy;
use super::command::endpoint_url;

#[derive(Debug, Clone)]
pub struct NetworkStrategy {
    client: Client,
}

impl NetworkStrategy {
    /// Build a strategy whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpoolError::Config(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn content_type(content: &JobContent) -> &'static str {
    match content {
        JobContent::Text(_) => "text/plain; charset=utf-8",
        JobContent::Binary(_) => "application/octet-stream",
    }
}

#[async_trait]
impl DispatchStrategy for NetworkStrategy {
    #[instrument(skip_all, fields(job_id = %job.id, printer = %printer.name))]
    async fn dispatch(&self, printer: &PrinterConfig, job: &PrintJob) -> DispatchResult {
        let address = printer
            .address()
            .ok_or_else(|| DispatchError::MissingNetworkAddress(printer.name.clone()))?;
        let url = endpoint_url(address);
        let body = job.content.as_bytes().to_vec();

        for copy in 1..=job.copies {
            let response = self
                .client
                .post(&url)
                .header(CONTENT_TYPE, content_type(&job.content))
                .body(body.clone())
                .send()
                .await
                .map_err(|e| {
                    error!(url = %url, error = %e, "network print request failed");
                    DispatchError::Transport(e.to_string())
                })?;

            let status = response.status();
            if !status.is_success() {
                error!(url = %url, status = status.as_u16(), "network printer rejected job");
                return Err(DispatchError::HttpStatus {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("").to_string(),
                });
            }
            debug!(copy, of = job.copies, "copy accepted");
        }

        info!(url = %url, copies = job.copies, "job sent to network printer");
        Ok(())
    }
}
