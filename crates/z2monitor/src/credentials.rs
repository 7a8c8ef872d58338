//! Persisted Credentials
//!
//! The API endpoint and the session token each live in a one-line file.
//! Missing files are filled in interactively on first run. An empty file is
//! deleted so the next run prompts again.

use ack_session::LinePort;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use zabbix_protocol::{validate_server_url, ApiError, ZabbixClient, API_ENDPOINT};

use crate::settings::Settings;

/// Credential failures; all of them stop the program before any API call
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("{what} in {} is empty; the file was deleted, run again to re-enter it", .path.display())]
    Empty { what: &'static str, path: PathBuf },

    #[error("Cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No {0} entered")]
    NoInput(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Port that can also read a line without echoing it
pub trait Prompter: LinePort {
    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Locations of the server and token files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    server_file: PathBuf,
    token_file: PathBuf,
}

impl CredentialStore {
    pub fn new(server_file: impl Into<PathBuf>, token_file: impl Into<PathBuf>) -> Self {
        Self {
            server_file: server_file.into(),
            token_file: token_file.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.server_file, &settings.token_file)
    }

    /// Endpoint URL, asking for the frontend base URL if none is saved
    pub fn server_url<P>(&self, port: &mut P) -> Result<String, CredentialError>
    where
        P: Prompter + ?Sized,
    {
        if let Some(url) = read_persisted(&self.server_file, "Server URL")? {
            validate_server_url(&url)?;
            return Ok(url);
        }

        port.write_line(
            "Where is your Zabbix located? (please include https/http - for example, https://localhost)",
        )
        .map_err(|e| io_error(&self.server_file, e))?;
        let base = port
            .read_line("> ")
            .map_err(|e| io_error(&self.server_file, e))?
            .map(|line| line.trim().trim_end_matches('/').to_string())
            .filter(|line| !line.is_empty())
            .ok_or(CredentialError::NoInput("server URL"))?;

        let url = format!("{}{}", base, API_ENDPOINT);
        validate_server_url(&url)?;
        save(&self.server_file, &url)?;
        info!("Saved server URL to {}", self.server_file.display());
        Ok(url)
    }

    /// Attach a session token to `client`, logging in if none is saved
    pub async fn authenticate<P>(
        &self,
        client: &mut ZabbixClient,
        port: &mut P,
    ) -> Result<(), CredentialError>
    where
        P: Prompter + ?Sized,
    {
        if let Some(token) = read_persisted(&self.token_file, "Token")? {
            client.set_token(token);
            return Ok(());
        }

        let user = port
            .read_line("Please enter your Zabbix username: ")
            .map_err(|e| io_error(&self.token_file, e))?
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .ok_or(CredentialError::NoInput("username"))?;
        let password = port
            .read_secret("Please enter your Zabbix password: ")
            .map_err(|e| io_error(&self.token_file, e))?
            .ok_or(CredentialError::NoInput("password"))?;

        let token = client.login(&user, &password).await?;
        save(&self.token_file, &token)?;
        info!("Saved session token to {}", self.token_file.display());
        Ok(())
    }

    /// Forget the saved token, e.g. after the server rejected it
    pub fn clear_token(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.token_file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.token_file, e)),
        }
    }
}

/// Read a one-line file; `None` when it does not exist
fn read_persisted(path: &Path, what: &'static str) -> Result<Option<String>, CredentialError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };

    let value = contents.trim();
    if value.is_empty() {
        warn!("Deleting empty {}", path.display());
        fs::remove_file(path).map_err(|e| io_error(path, e))?;
        return Err(CredentialError::Empty {
            what,
            path: path.to_path_buf(),
        });
    }
    Ok(Some(value.to_string()))
}

fn save(path: &Path, value: &str) -> Result<(), CredentialError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(path, value).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: io::Error) -> CredentialError {
    CredentialError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ack_session::ScriptedPort;
    use zabbix_protocol::ClientOptions;

    struct TestPrompter {
        lines: ScriptedPort,
        secrets: Vec<String>,
    }

    impl TestPrompter {
        fn new(lines: &[&str], secrets: &[&str]) -> Self {
            Self {
                lines: ScriptedPort::new(lines.iter().copied()),
                secrets: secrets.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl LinePort for TestPrompter {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.lines.write_line(line)
        }

        fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.lines.read_line(prompt)
        }
    }

    impl Prompter for TestPrompter {
        fn read_secret(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Ok(self.secrets.pop())
        }
    }

    fn store(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("server"), dir.path().join("token"))
    }

    fn client() -> ZabbixClient {
        ZabbixClient::new("https://zabbix.example.com/api_jsonrpc.php", ClientOptions::default())
            .unwrap()
    }

    #[test]
    fn test_saved_server_url_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(dir.path().join("server"), "https://zbx.local/api_jsonrpc.php\n").unwrap();

        let mut port = TestPrompter::new(&[], &[]);
        let url = store.server_url(&mut port).unwrap();
        assert_eq!(url, "https://zbx.local/api_jsonrpc.php");
        assert!(port.lines.prompts().is_empty());
    }

    #[test]
    fn test_missing_server_url_is_prompted_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let mut port = TestPrompter::new(&["https://zbx.local/"], &[]);
        let url = store.server_url(&mut port).unwrap();

        assert_eq!(url, "https://zbx.local/api_jsonrpc.php");
        assert_eq!(
            fs::read_to_string(dir.path().join("server")).unwrap(),
            "https://zbx.local/api_jsonrpc.php"
        );
    }

    #[test]
    fn test_invalid_server_url_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let mut port = TestPrompter::new(&["zbx.local"], &[]);
        let err = store.server_url(&mut port).unwrap_err();
        assert!(matches!(err, CredentialError::Api(ApiError::InvalidUrl(_))));
        assert!(!dir.path().join("server").exists());
    }

    #[test]
    fn test_empty_file_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let path = dir.path().join("server");
        fs::write(&path, "  \n").unwrap();

        let mut port = TestPrompter::new(&[], &[]);
        let err = store.server_url(&mut port).unwrap_err();
        assert!(matches!(err, CredentialError::Empty { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_closed_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut port = TestPrompter::new(&[], &[]);
        let err = store(&dir).server_url(&mut port).unwrap_err();
        assert!(matches!(err, CredentialError::NoInput("server URL")));
    }

    #[tokio::test]
    async fn test_saved_token_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(dir.path().join("token"), "0424bd59b807674191e7d77572075f33\n").unwrap();

        let mut client = client();
        let mut port = TestPrompter::new(&[], &[]);
        store.authenticate(&mut client, &mut port).await.unwrap();
        assert!(client.has_token());
    }

    #[tokio::test]
    async fn test_empty_token_file_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(dir.path().join("token"), "").unwrap();

        let mut client = client();
        let mut port = TestPrompter::new(&[], &[]);
        let err = store.authenticate(&mut client, &mut port).await.unwrap_err();

        assert!(matches!(err, CredentialError::Empty { what: "Token", .. }));
        assert!(!dir.path().join("token").exists());
        assert!(!client.has_token());
    }

    #[tokio::test]
    async fn test_missing_password_stops_before_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let mut client = client();
        let mut port = TestPrompter::new(&["admin"], &[]);
        let err = store.authenticate(&mut client, &mut port).await.unwrap_err();

        assert!(matches!(err, CredentialError::NoInput("password")));
        assert!(!dir.path().join("token").exists());
    }

    #[test]
    fn test_clear_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(dir.path().join("token"), "abc").unwrap();

        store.clear_token().unwrap();
        assert!(!dir.path().join("token").exists());
        store.clear_token().unwrap();
    }
}
