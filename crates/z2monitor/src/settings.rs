//! Settings
//!
//! Layered with the `config` crate: built-in defaults, then a TOML file, then
//! `Z2MONITOR_*` environment variables. Command-line flags are applied on top
//! by the caller.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use zabbix_protocol::ClientOptions;

/// Prefix of settings environment variables
pub const ENV_PREFIX: &str = "Z2MONITOR";

const SERVER_FILE: &str = ".zmonitor-server";
const TOKEN_FILE: &str = ".zmonitor-token";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// File holding the API endpoint URL
    pub server_file: PathBuf,
    /// File holding the session token
    pub token_file: PathBuf,
    /// Seconds between dashboard refreshes
    pub refresh_interval_secs: u64,
    /// Severity floor when `--min-severity` is not given
    pub min_severity: u8,
    pub request_timeout_secs: u64,
    /// Accept self-signed frontend certificates
    pub accept_invalid_certs: bool,
    /// Failed dashboard cycles in a row before giving up
    pub max_consecutive_failures: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_default();
        Self {
            server_file: home.join(SERVER_FILE),
            token_file: home.join(TOKEN_FILE),
            refresh_interval_secs: 10,
            min_severity: 2,
            request_timeout_secs: 30,
            accept_invalid_certs: false,
            max_consecutive_failures: 3,
        }
    }
}

impl Settings {
    /// Load settings
    ///
    /// An explicit `path` must exist. Without one, the per-user config file is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some((path.to_path_buf(), true)),
            None => default_config_path().map(|path| (path, false)),
        };

        let mut builder = Config::builder();
        if let Some((path, required)) = file {
            debug!("Reading settings from {}", path.display());
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(Self {
            server_file: expand_home(&settings.server_file),
            token_file: expand_home(&settings.token_file),
            ..settings
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

/// `~/.config/z2monitor/config.toml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("z2monitor").join("config.toml"))
}

/// Resolve a leading `~` against the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.refresh_interval(), Duration::from_secs(10));
        assert_eq!(settings.min_severity, 2);
        assert_eq!(settings.max_consecutive_failures, 3);
        assert!(settings.server_file.ends_with(".zmonitor-server"));
        assert!(settings.token_file.ends_with(".zmonitor-token"));
        assert!(!settings.client_options().accept_invalid_certs);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = settings_file(
            "min_severity = 4\nrefresh_interval_secs = 30\nserver_file = \"/tmp/z2-server\"\n",
        );
        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.min_severity, 4);
        assert_eq!(settings.refresh_interval_secs, 30);
        assert_eq!(settings.server_file, PathBuf::from("/tmp/z2-server"));
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/etc/z2")), PathBuf::from("/etc/z2"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/.zmonitor-token")), home.join(".zmonitor-token"));
        }
    }

    #[test]
    fn test_refresh_interval_never_zero() {
        let settings = Settings {
            refresh_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(settings.refresh_interval(), Duration::from_secs(1));
    }
}
