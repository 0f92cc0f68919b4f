use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pool::DestinationPool;
use crate::server::Endpoint;
use crate::transfer::{BackoffPolicy, Credentials, Ssh2Client};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";
pub const AUDIT_LOG_NAME: &str = "sftp_transfers.log";
pub const MANIFEST_LOG_NAME: &str = "upload_manifest.log";
pub const FAILURES_NAME: &str = "failed_jobs.jsonl";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub sftp_servers: Vec<Endpoint>,
    pub private_key_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_passphrase: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms", alias = "backoff_base")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_io_timeout() -> u64 {
    30
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    /// Reads, parses and validates the config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let mut config: Config = serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.private_key_path = expand_tilde(&config.private_key_path);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // pool construction enforces >= 2 distinct endpoints
        DestinationPool::new(self.sftp_servers.clone())?;
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidRetries);
        }
        if !self.private_key_path.is_file() {
            return Err(ConfigError::MissingCredential(self.private_key_path.clone()));
        }
        Ok(())
    }

    /// A fresh pool per run, cursor on the first configured endpoint.
    pub fn pool(&self) -> Result<DestinationPool, ConfigError> {
        Ok(DestinationPool::new(self.sftp_servers.clone())?)
    }

    pub fn credentials(&self, username: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            private_key: self.private_key_path.clone(),
            passphrase: self.private_key_passphrase.clone(),
        }
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::from_millis(self.backoff_base_ms)
    }

    pub fn client(&self) -> Ssh2Client {
        Ssh2Client {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            io_timeout: Duration::from_secs(self.io_timeout_secs),
        }
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.log_dir.join(AUDIT_LOG_NAME)
    }

    pub fn failures_path(&self) -> PathBuf {
        self.log_dir.join(FAILURES_NAME)
    }
}

fn expand_tilde(p: &Path) -> PathBuf {
    let Ok(rest) = p.strip_prefix("~") else {
        return p.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => p.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let p = dir.join("config.json");
        fs::write(&p, body).unwrap();
        p
    }

    fn key(dir: &Path) -> String {
        let k = dir.join("id_rsa");
        fs::write(&k, b"not a real key").unwrap();
        k.to_string_lossy().replace('\\', "/")
    }

    #[test]
    fn loads_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            r#"{{"sftp_servers": ["localhost:2222", "localhost:2223"], "private_key_path": "{}"}}"#,
            key(dir.path())
        );
        let cfg = Config::load(write_config(dir.path(), &body)).unwrap();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.backoff_base_ms, 1000);
        assert_eq!(cfg.log_dir, PathBuf::from("logs"));
        assert_eq!(cfg.pool().unwrap().len(), 2);
        assert_eq!(cfg.audit_log_path(), PathBuf::from("logs").join(AUDIT_LOG_NAME));
    }

    #[test]
    fn backoff_base_alias_and_retries() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            r#"{{"sftp_servers": ["a", "b"], "private_key_path": "{}", "backoff_base": 5, "max_retries": 7}}"#,
            key(dir.path())
        );
        let cfg = Config::load(write_config(dir.path(), &body)).unwrap();
        assert_eq!(cfg.backoff(), BackoffPolicy::from_millis(5));
        assert_eq!(cfg.max_retries, 7);
    }

    #[test]
    fn single_endpoint_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            r#"{{"sftp_servers": ["only:22"], "private_key_path": "{}"}}"#,
            key(dir.path())
        );
        let err = Config::load(write_config(dir.path(), &body)).unwrap_err();
        assert!(matches!(err, ConfigError::Pool(crate::error::PoolError::TooFewEndpoints(1))));
    }

    #[test]
    fn missing_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"sftp_servers": ["a", "b"], "private_key_path": "/definitely/not/here"}"#;
        let err = Config::load(write_config(dir.path(), body)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn zero_retries_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            r#"{{"sftp_servers": ["a", "b"], "private_key_path": "{}", "max_retries": 0}}"#,
            key(dir.path())
        );
        let err = Config::load(write_config(dir.path(), &body)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRetries));
    }

    #[test]
    fn unreadable_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(dir.path().join("absent.json")).unwrap_err(),
            ConfigError::Read { .. }
        ));
        let p = write_config(dir.path(), "{ not json");
        assert!(matches!(Config::load(p).unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/.ssh/id_rsa")), home.join(".ssh/id_rsa"));
        }
        assert_eq!(expand_tilde(Path::new("/abs/key")), PathBuf::from("/abs/key"));
    }
}
