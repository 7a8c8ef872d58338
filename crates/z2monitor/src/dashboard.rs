//! Dashboard Loop
//!
//! poll -> render -> sleep, one cycle at a time. Transport failures are shown
//! on screen and retried on the next interval; any other failure ends the
//! loop.

use anyhow::{Context, Result};
use chrono::Local;
use event_engine::{EngineError, EventPoller};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};
use zabbix_protocol::AlertBackend;

use crate::render::{self, Frame};
use crate::settings::Settings;
use crate::terminal;

/// Loop parameters
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub refresh: Duration,
    /// Failed cycles in a row before giving up
    pub max_consecutive_failures: u32,
    pub frontend_url: String,
}

impl DashboardOptions {
    pub fn new(settings: &Settings, frontend_url: impl Into<String>) -> Self {
        Self {
            refresh: settings.refresh_interval(),
            max_consecutive_failures: settings.max_consecutive_failures.max(1),
            frontend_url: frontend_url.into(),
        }
    }
}

/// Refresh the dashboard until interrupted or until polling keeps failing
pub async fn run<B, W>(
    backend: &B,
    poller: &EventPoller,
    options: &DashboardOptions,
    out: &mut W,
) -> Result<()>
where
    B: AlertBackend + ?Sized,
    W: Write,
{
    info!(
        "Starting dashboard, refreshing every {:?}",
        options.refresh
    );
    let mut failures = 0u32;

    loop {
        let clock = Local::now().format("%T").to_string();
        let (width, height) = terminal::size();
        let frame = Frame {
            clock: &clock,
            width,
            height,
            frontend_url: &options.frontend_url,
            refresh_secs: options.refresh.as_secs(),
        };

        match poller.poll(backend, Local::now().timestamp()).await {
            Ok(snapshot) => {
                failures = 0;
                debug!(
                    "Showing {} events ({} unacknowledged)",
                    snapshot.events.len(),
                    snapshot.unacknowledged_count()
                );
                terminal::paint(out, &render::dashboard(&snapshot.events, &frame), true)?;
            }
            Err(e) if e.is_transient() => {
                failures += 1;
                warn!(
                    "Dashboard update failed ({}/{}): {}",
                    failures, options.max_consecutive_failures, e
                );
                if failures >= options.max_consecutive_failures {
                    return Err(give_up(e, failures));
                }
                let lines = render::failure(
                    &frame,
                    &e.to_string(),
                    failures,
                    options.max_consecutive_failures,
                );
                terminal::paint(out, &lines, true)?;
            }
            Err(e) => return Err(e).context("Cannot update the dashboard"),
        }

        tokio::time::sleep(options.refresh).await;
    }
}

fn give_up(error: EngineError, failures: u32) -> anyhow::Error {
    anyhow::Error::new(error).context(format!(
        "Giving up after {} failed updates in a row",
        failures
    ))
}

/// Print every event once, without clearing or fitting to the screen
pub async fn list_once<B, W>(backend: &B, poller: &EventPoller, out: &mut W) -> Result<usize>
where
    B: AlertBackend + ?Sized,
    W: Write,
{
    let snapshot = poller
        .poll(backend, Local::now().timestamp())
        .await
        .context("Cannot fetch active triggers")?;
    terminal::paint(out, &render::full_list(&snapshot.events), false)?;
    Ok(snapshot.events.len())
}
