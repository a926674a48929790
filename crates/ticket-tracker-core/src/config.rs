use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Configuration of the ticket tracker
///
/// Every key is optional in a config file; missing keys keep their defaults.
#[derive(Clone, PartialEq, Eq, Deserialize, Debug)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Address for the HTTP server to listen on
    pub host: String,
    /// Port for the HTTP server to listen on, `0` picks a free one
    pub port: u16,
    /// Number of HTTP worker threads
    pub workers: u16,
    /// Origins that may issue cross-origin requests
    pub allowed_origins: Vec<String>,
    /// Start with the example tickets in the store
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8080,
            workers: 16,
            allowed_origins: vec![
                String::from("http://localhost:5173"),
                String::from("http://localhost:3000"),
            ],
            seed: true,
        }
    }
}

/// Failure to load a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("could not read {}: {source}", path.display())]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The file is not valid TOML or has fields of the wrong type
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },
}

impl Config {
    /// Load the configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Parse the configuration from a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Whether `origin` may issue cross-origin requests
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn file_overrides_single_keys() {
        let config = Config::from_toml_str(
            r#"
            port = 9090
            allowed-origins = ["https://tickets.example.org"]
            seed = false
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.workers, 16);
        assert!(!config.seed);
        assert!(config.is_origin_allowed("https://tickets.example.org"));
        assert!(!config.is_origin_allowed("http://localhost:5173"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(Config::from_toml_str("port = \"eighty\"").is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load("/nonexistent/ticket-tracker.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
