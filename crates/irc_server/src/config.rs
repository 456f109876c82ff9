//! Startup configuration (§6): loaded once from a TOML file via `serde` +
//! `toml`, the same pairing the rest of this codebase uses for
//! deserialization.

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub port: u16,
    pub hostname: String,
    pub motd: Option<PathBuf>,
    pub password: Option<String>,
    pub network_name: Option<String>,
    pub network_created_on: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path_str.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path_str,
            source,
        })
    }
}

/// CLI surface for the standalone binary: a config file path plus a couple
/// of overrides, handled with `clap` like the rest of the workspace
/// already depends on (unused by the original config loader).
#[derive(Debug, Parser)]
#[command(name = "irc_server", about = "Embeddable IRC server")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "irc_server.toml")]
    pub config: PathBuf,

    /// Override the configured listen port.
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load(&self.config)?;
        if let Some(port) = self.port {
            config.port = port;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let toml = r#"
            port = 6667
            hostname = "irc.example.org"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.port, 6667);
        assert_eq!(config.hostname, "irc.example.org");
        assert!(config.motd.is_none());
        assert!(config.password.is_none());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load("/no/such/path.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
