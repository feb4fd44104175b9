//! Runtime configuration.
//!
//! Configuration is assembled once at startup from three layers, each
//! overriding the previous one:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. An optional TOML file passed with `--config`.
//! 3. Command-line flags and the positional user-data directory.
//!
//! The resulting [`Config`] is immutable and shared with request handlers
//! behind an `Arc`.
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! port_attempts = 10
//!
//! [storage]
//! data_dir = "./training-data"
//! static_dir = "./public"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the directory that holds per-gesture sample directories.
pub const TRAINING_DATA_DIR: &str = "training-data";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How many successive ports to try when the configured one is taken.
    #[serde(default = "default_port_attempts")]
    pub port_attempts: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            port_attempts: default_port_attempts(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_port_attempts() -> u16 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Training-data root. Gesture directories are created directly below it.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Base directory for front-end assets. `None` means the directory
    /// containing the running executable.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            static_dir: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".").join(TRAINING_DATA_DIR)
}

/// Values supplied on the command line. Every field is optional; a `None`
/// leaves the file or default value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub user_data_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Apply command-line overrides on top of this configuration.
    ///
    /// A user-data directory (as passed by a host application) places the
    /// training-data root at `<user_data_dir>/training-data`.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(dir) = overrides.user_data_dir {
            self.storage.data_dir = dir.join(TRAINING_DATA_DIR);
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(dir) = overrides.static_dir {
            self.storage.static_dir = Some(dir);
        }
        self
    }

    /// Resolve the static asset directory, falling back to the directory
    /// that contains the current executable.
    pub fn static_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.static_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe().context("Failed to locate running executable")?;
        Ok(exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port_attempts == 0 {
            anyhow::bail!("server.port_attempts must be >= 1");
        }
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            anyhow::bail!("storage.data_dir must not be empty");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.port_attempts, 10);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert!(cfg.storage.data_dir.ends_with("training-data"));
        assert!(cfg.storage.static_dir.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[server]\nport = 9100\n").unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.port_attempts, 10);
        assert!(cfg.storage.data_dir.ends_with("training-data"));
    }

    #[test]
    fn test_user_data_dir_appends_training_data() {
        let cfg = Config::default().with_overrides(Overrides {
            user_data_dir: Some(PathBuf::from("/home/me/.app")),
            ..Default::default()
        });
        assert_eq!(
            cfg.storage.data_dir,
            PathBuf::from("/home/me/.app").join("training-data")
        );
    }

    #[test]
    fn test_flags_override_file() {
        let cfg: Config = toml::from_str(
            r#"
[server]
host = "0.0.0.0"
port = 9100

[storage]
static_dir = "/srv/app"
"#,
        )
        .unwrap();
        let cfg = cfg.with_overrides(Overrides {
            port: Some(9200),
            static_dir: Some(PathBuf::from("/opt/app")),
            ..Default::default()
        });
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9200);
        assert_eq!(cfg.static_dir().unwrap(), PathBuf::from("/opt/app"));
    }

    #[test]
    fn test_zero_port_attempts_rejected() {
        let cfg: Config = toml::from_str("[server]\nport_attempts = 0\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
