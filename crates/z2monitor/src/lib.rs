//! Z2monitor
//!
//! Terminal dashboard of active Zabbix triggers, worst and oldest first, with
//! interactive batch acknowledgment:
//! - Settings and persisted credentials
//! - Refreshing dashboard or one-shot list
//! - Acknowledgment sessions driven from the terminal

pub mod ack;
pub mod cli;
pub mod credentials;
pub mod dashboard;
pub mod logging;
pub mod render;
pub mod settings;
pub mod terminal;

use anyhow::{Context, Result};
use event_engine::EventPoller;
use std::io;
use std::process::ExitCode;
use tracing::{info, warn};
use zabbix_protocol::{ApiError, ZabbixClient};

pub use cli::Cli;
pub use logging::{init_logging, Verbosity};
pub use settings::Settings;

use credentials::CredentialStore;
use dashboard::DashboardOptions;
use terminal::StdioPort;

const SESSION_REMOVED: &str =
    "The saved Zabbix session is no longer valid and was removed; run again to log in";

/// Run the command selected by `cli`
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref()).context("Cannot load settings")?;
    let store = CredentialStore::from_settings(&settings);
    let mut port = StdioPort::new();

    let url = store
        .server_url(&mut port)
        .context("Cannot determine the Zabbix server")?;
    let mut client = ZabbixClient::new(&url, settings.client_options())
        .context("Cannot create the Zabbix client")?;
    store
        .authenticate(&mut client, &mut port)
        .await
        .context("Cannot log in to Zabbix")?;

    let poller = EventPoller::new(cli.poll_settings(&settings));
    let result = dispatch(&cli, &settings, &client, &poller, &mut port).await;
    forget_rejected_session(&store, result)
}

async fn dispatch(
    cli: &Cli,
    settings: &Settings,
    client: &ZabbixClient,
    poller: &EventPoller,
    port: &mut StdioPort,
) -> Result<ExitCode> {
    if let Some(pattern) = cli.ack_pattern() {
        info!("Acknowledging events matching '{}'", pattern);
        let clean = ack::acknowledge(client, poller, &pattern, port).await?;
        return Ok(if clean {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let mut stdout = io::stdout();
    if cli.list {
        dashboard::list_once(client, poller, &mut stdout).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let options = DashboardOptions::new(settings, client.frontend_url());
    dashboard::run(client, poller, &options, &mut stdout).await?;
    Ok(ExitCode::SUCCESS)
}

/// Whether `err` was caused by the server refusing the saved token
fn session_rejected(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(ApiError::is_session_rejected)
}

/// Delete the saved token when the server refused it, so the next run logs in
fn forget_rejected_session(store: &CredentialStore, result: Result<ExitCode>) -> Result<ExitCode> {
    match result {
        Err(e) if session_rejected(&e) => {
            warn!("Zabbix rejected the saved session token, removing it");
            store.clear_token()?;
            Err(e.context(SESSION_REMOVED))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_engine::EngineError;
    use std::fs;

    fn rejected() -> anyhow::Error {
        let err = EngineError::from(ApiError::Backend {
            code: -32602,
            message: "Invalid params.".to_string(),
            data: "Session terminated, re-login, please.".to_string(),
        });
        anyhow::Error::new(err).context("Cannot update the dashboard")
    }

    fn store_with_token(dir: &tempfile::TempDir) -> CredentialStore {
        fs::write(dir.path().join("token"), "0424bd59b807674191e7d77572075f33").unwrap();
        CredentialStore::new(dir.path().join("server"), dir.path().join("token"))
    }

    #[test]
    fn test_rejected_session_removes_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_token(&dir);

        let err = forget_rejected_session(&store, Err(rejected())).unwrap_err();

        assert!(!dir.path().join("token").exists());
        assert!(err.to_string().contains("run again to log in"));
    }

    #[test]
    fn test_other_failures_keep_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_token(&dir);

        let transport = anyhow::Error::new(EngineError::from(ApiError::Transport(
            "connection refused".to_string(),
        )));
        assert!(forget_rejected_session(&store, Err(transport)).is_err());
        assert!(forget_rejected_session(&store, Ok(ExitCode::SUCCESS)).is_ok());
        assert!(dir.path().join("token").exists());
    }
}
