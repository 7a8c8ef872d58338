//! Acknowledge Command

use ack_session::{AckReport, AckSession, LinePort, SessionOutcome};
use anyhow::{bail, Context, Result};
use chrono::Local;
use event_engine::EventPoller;
use zabbix_protocol::AlertBackend;

/// Run one acknowledgment session for `pattern`
///
/// Returns `false` when any acknowledgment failed, after listing every failed
/// item. An aborted session is not a failure.
pub async fn acknowledge<B, P>(
    backend: &B,
    poller: &EventPoller,
    pattern: &str,
    port: &mut P,
) -> Result<bool>
where
    B: AlertBackend + ?Sized,
    P: LinePort + ?Sized,
{
    if pattern.trim().is_empty() {
        bail!("The acknowledgment pattern is empty after removing unsupported characters");
    }

    let snapshot = poller
        .poll(backend, Local::now().timestamp())
        .await
        .context("Cannot fetch active triggers")?;

    let mut session = AckSession::new(pattern);
    let outcome = session
        .run(&snapshot.events, backend, port)
        .await
        .context("Acknowledgment session failed")?;

    match outcome {
        SessionOutcome::Aborted(reason) => {
            port.write_line(&reason.to_string())?;
            Ok(true)
        }
        SessionOutcome::Committed(report) => summarize(&report, port),
    }
}

fn summarize<P>(report: &AckReport, port: &mut P) -> Result<bool>
where
    P: LinePort + ?Sized,
{
    if report.is_complete() {
        return Ok(true);
    }

    port.write_line("")?;
    for item in report.failed() {
        if let Err(e) = &item.result {
            port.write_line(&format!(
                "Failed to acknowledge {} ({}): {}",
                item.description, item.hostname, e
            ))?;
        }
    }
    port.write_line(&format!(
        "{} of {} acknowledgments succeeded.",
        report.succeeded(),
        report.items.len()
    ))?;
    Ok(false)
}
