//! Command Line

use clap::Parser;
use event_engine::PollSettings;
use std::path::PathBuf;

use crate::logging::Verbosity;
use crate::settings::Settings;

/// Zabbix trigger dashboard with batch acknowledgment
#[derive(Debug, Parser)]
#[command(name = "z2monitor", version, about)]
pub struct Cli {
    /// Acknowledge active events matching MATCH instead of showing the dashboard
    #[arg(short = 'a', long = "ack", value_name = "MATCH")]
    pub ack: Option<String>,

    /// Filter out hosts in maintenance
    #[arg(short = 'm', long)]
    pub disable_maintenance: bool,

    /// Only show unacknowledged events
    #[arg(short = 'H', long)]
    pub hide_acknowledged: bool,

    /// Lowest severity to show (0-5)
    #[arg(short = 's', long, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub min_severity: Option<u8>,

    /// Only these severities, comma-separated
    #[arg(
        short = 'p',
        long,
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(0..=5)
    )]
    pub priority: Vec<u8>,

    /// Only this host
    #[arg(long, value_name = "NAME")]
    pub host: Option<String>,

    /// Print every event once and exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Settings file
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Errors only
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    /// Poll filters: flags over settings
    pub fn poll_settings(&self, settings: &Settings) -> PollSettings {
        PollSettings {
            min_severity: self.min_severity.unwrap_or(settings.min_severity),
            exclude_maintenance: self.disable_maintenance,
            hide_acknowledged: self.hide_acknowledged,
            host_filter: self.host.clone(),
            priorities: self.priority.clone(),
        }
    }

    /// Sanitized acknowledgment pattern, if one was given
    pub fn ack_pattern(&self) -> Option<String> {
        self.ack.as_deref().map(sanitize_pattern)
    }
}

/// Drop every character outside `[ A-Za-z0-9[]{}()|,-]`
pub fn sanitize_pattern(pattern: &str) -> String {
    pattern
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || " []{}()|,-".contains(*c))
        .collect()
}
