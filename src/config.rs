//! Server profile configuration.
//!
//! Profiles live in a TOML file of `[servers.<name>]` tables:
//!
//! ```toml
//! [servers.prod]
//! server = "https://erp.example.com"
//! database = "prod"
//! user = "admin"
//! password = "secret"
//! ```
//!
//! Candidates, in increasing precedence: `openerp.toml` in the working
//! directory, `~/.openerp.toml`, then the file named by `$OPENERP_CONFIG`.
//! The most preferred existing candidate is used, so a home-directory file
//! overrides a checked-out one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::client::{authenticate, Client};
use crate::error::RpcError;

/// Connection settings for one named server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Base URL, e.g. "https://erp.example.com".
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

/// The parsed profile file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerProfile>,
}

/// Configuration loading/lookup failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found (tried {0})")]
    NotFound(String),

    #[error("no such server profile: {0}")]
    UnknownProfile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure of the one-shot profile connect: either the profile could not
/// be loaded or the authentication itself failed.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl ProfileConfig {
    /// Parse a specific file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Find and parse the default file, per the module-level lookup order.
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = candidate_paths();
        match candidates.iter().rev().find(|p| p.is_file()) {
            Some(path) => {
                debug!("loading profiles from {}", path.display());
                Self::load(path)
            }
            None => Err(ConfigError::NotFound(
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }

    /// Look a profile up by name.
    pub fn profile(&self, name: &str) -> Result<&ServerProfile, ConfigError> {
        self.servers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }
}

impl ServerProfile {
    /// Authenticate against this profile's server.
    pub fn connect(&self) -> Result<Client, RpcError> {
        authenticate(&self.server, &self.database, &self.user, &self.password)
    }
}

/// Load the default configuration and connect to the named profile.
pub fn connect_profile(name: &str) -> Result<Client, ConnectError> {
    let config = ProfileConfig::load_default()?;
    let profile = config.profile(name)?;
    Ok(profile.connect()?)
}

/// Candidate config files, least preferred first.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("openerp.toml")];
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        paths.push(PathBuf::from(home).join(".openerp.toml"));
    }
    if let Ok(explicit) = std::env::var("OPENERP_CONFIG") {
        paths.push(PathBuf::from(explicit));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openerp.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn load_and_look_up_profile() {
        let (_dir, path) = write_config(
            r#"
            [servers.prod]
            server = "https://erp.example.com"
            database = "prod"
            user = "admin"
            password = "secret"

            [servers.stage]
            server = "http://localhost:8069"
            database = "stage"
            user = "demo"
            password = "demo"
            "#,
        );

        let config = ProfileConfig::load(&path).unwrap();
        assert_eq!(config.servers.len(), 2);

        let prod = config.profile("prod").unwrap();
        assert_eq!(prod.server, "https://erp.example.com");
        assert_eq!(prod.database, "prod");
        assert_eq!(prod.user, "admin");
    }

    #[test]
    fn unknown_profile_is_a_typed_error() {
        let (_dir, path) = write_config("[servers]\n");
        let config = ProfileConfig::load(&path).unwrap();
        match config.profile("nope") {
            Err(ConfigError::UnknownProfile(name)) => assert_eq!(name, "nope"),
            other => panic!("expected UnknownProfile, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_fails_to_parse() {
        let (_dir, path) = write_config(
            r#"
            [servers.partial]
            server = "http://localhost:8069"
            database = "demo"
            "#,
        );
        assert!(matches!(
            ProfileConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn roundtrip() {
        let mut config = ProfileConfig::default();
        config.servers.insert(
            "test".into(),
            ServerProfile {
                server: "http://localhost:8069".into(),
                database: "demo".into(),
                user: "admin".into(),
                password: "admin".into(),
            },
        );

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: ProfileConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.servers["test"].database, "demo");
    }
}
