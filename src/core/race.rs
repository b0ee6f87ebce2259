//! Purpose: Concurrent endpoint latency race with per-probe timeout.
//! Exports: `Racer`, `ProbeReport`, `PROBE_PATH`, `PROBE_TIMEOUT`.
//! Role: Picks the fastest of several candidate endpoints by real transfer time.
//! Invariants: One report per target, in input order; the batch never fails.
//! Invariants: Probe failures are contained in their own report entry.

use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};

/// Well-known resource fetched from each candidate endpoint.
pub const PROBE_PATH: &str = "test.bin";

/// Per-probe deadline. Expiry aborts that probe's request only.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbeReport {
    pub url: String,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fastest: bool,
}

impl ProbeReport {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

enum ProbeOutcome {
    Success { elapsed: Duration },
    Failure { elapsed: Duration, reason: String },
}

impl ProbeOutcome {
    fn elapsed_ms(&self) -> f64 {
        let elapsed = match self {
            ProbeOutcome::Success { elapsed } => elapsed,
            ProbeOutcome::Failure { elapsed, .. } => elapsed,
        };
        elapsed.as_secs_f64() * 1000.0
    }
}

pub struct Racer {
    client: reqwest::Client,
    timeout: Duration,
}

impl Racer {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::Client::builder().build().map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to build http client")
                .with_source(err)
        })?;
        Ok(Self {
            client,
            timeout: PROBE_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probes every target concurrently and reports elapsed time, failure,
    /// and which endpoints (ties included) were fastest.
    pub async fn race<S: AsRef<str>>(&self, targets: &[S], debug_log: bool) -> Vec<ProbeReport> {
        if targets.is_empty() {
            if debug_log {
                tracing::warn!("no probe targets supplied");
            }
            return Vec::new();
        }

        let outcomes = join_all(targets.iter().map(|target| self.probe(target.as_ref()))).await;
        let reports = rank(targets, outcomes);

        if debug_log {
            for report in &reports {
                log_report(report);
            }
        }
        reports
    }

    async fn probe(&self, target: &str) -> ProbeOutcome {
        let url = probe_url(target);
        let start = Instant::now();
        let attempt = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|err| err.to_string())?;
            let status = response.status();
            if !status.is_success() {
                return Err(format!("http status {status}"));
            }
            // Drain the body so the clock covers transfer, not just headers.
            response.bytes().await.map_err(|err| err.to_string())?;
            Ok(())
        };

        // Dropping the attempt on timeout aborts the in-flight request.
        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(())) => ProbeOutcome::Success {
                elapsed: start.elapsed(),
            },
            Ok(Err(reason)) => ProbeOutcome::Failure {
                elapsed: start.elapsed(),
                reason,
            },
            Err(_) => ProbeOutcome::Failure {
                elapsed: start.elapsed(),
                reason: format!("timed out after {}ms", self.timeout.as_millis()),
            },
        }
    }
}

pub fn probe_url(target: &str) -> String {
    if target.ends_with('/') {
        format!("{target}{PROBE_PATH}")
    } else {
        format!("{target}/{PROBE_PATH}")
    }
}

fn rank<S: AsRef<str>>(targets: &[S], outcomes: Vec<ProbeOutcome>) -> Vec<ProbeReport> {
    // Minimum over successes only; comparison happens on unrounded values.
    let min_elapsed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, ProbeOutcome::Success { .. }))
        .map(ProbeOutcome::elapsed_ms)
        .fold(f64::INFINITY, f64::min);

    targets
        .iter()
        .zip(outcomes)
        .map(|(target, outcome)| {
            let elapsed_ms = outcome.elapsed_ms();
            match outcome {
                ProbeOutcome::Success { .. } => ProbeReport {
                    url: target.as_ref().to_string(),
                    elapsed_ms: round2(elapsed_ms),
                    error: None,
                    fastest: elapsed_ms == min_elapsed,
                },
                ProbeOutcome::Failure { reason, .. } => ProbeReport {
                    url: target.as_ref().to_string(),
                    elapsed_ms: round2(elapsed_ms),
                    error: Some(reason),
                    fastest: false,
                },
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn log_report(report: &ProbeReport) {
    match &report.error {
        Some(reason) => tracing::info!(
            url = %report.url,
            elapsed_ms = report.elapsed_ms,
            error = %reason,
            "probe failed"
        ),
        None => tracing::info!(
            url = %report.url,
            elapsed_ms = report.elapsed_ms,
            fastest = report.fastest,
            "probe finished"
        ),
    }
}
