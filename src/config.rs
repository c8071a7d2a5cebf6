//! Configuration structures for registry-mirror
//!
//! The YAML file describes the two registries taking part in the mirror:
//!
//! ```yaml
//! src:
//!   host: registry.internal:5000
//!   ssl: false
//! dest:
//!   host: harbor.example.com/mirror
//!   user: robot
//!   pass_env: HARBOR_PASSWORD
//! ```
//!
//! Loading resolves defaults, password indirection and validation once, so the
//! resulting [`MirrorConfig`] is immutable for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Transport used when an endpoint does not name one
pub const DEFAULT_TRANSPORT: &str = "docker";

/// Source and destination registries
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MirrorConfig {
    /// Registry the catalog is read from
    pub src: EndpointConfig,

    /// Registry repositories are mirrored into
    pub dest: EndpointConfig,
}

/// Connection settings for one registry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Registry host, optionally with port and path prefix
    pub host: String,

    /// Username for the sync tool and the catalog request
    #[serde(default)]
    pub user: Option<String>,

    /// Password (mutually exclusive with `pass_env`)
    #[serde(default)]
    pub pass: Option<String>,

    /// Environment variable containing the password
    #[serde(default)]
    pub pass_env: Option<String>,

    /// Transport scheme handed to skopeo (default: docker)
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Whether the registry is reached over TLS (default: true)
    #[serde(default = "default_ssl")]
    pub ssl: bool,

    /// Alternative host for the catalog API call
    #[serde(default)]
    pub api: Option<String>,
}

fn default_transport() -> String {
    DEFAULT_TRANSPORT.to_string()
}

fn default_ssl() -> bool {
    true
}

impl MirrorConfig {
    /// Read, parse and resolve the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: MirrorConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.resolve()
    }

    /// Apply defaults, resolve `pass_env` and validate both endpoints
    pub fn resolve(self) -> Result<Self, ConfigError> {
        Ok(Self {
            src: self.src.resolve("src")?,
            dest: self.dest.resolve("dest")?,
        })
    }

    /// Whether either registry is reached without TLS
    pub fn any_insecure(&self) -> bool {
        self.src.is_insecure() || self.dest.is_insecure()
    }

    /// Hosts that must be declared insecure, source first
    pub fn insecure_hosts(&self) -> Vec<&str> {
        [&self.src, &self.dest]
            .into_iter()
            .filter(|endpoint| endpoint.is_insecure())
            .map(|endpoint| endpoint.host.as_str())
            .collect()
    }
}

impl EndpointConfig {
    fn resolve(mut self, name: &str) -> Result<Self, ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("{}.host", name),
            });
        }

        if self.transport.trim().is_empty() {
            self.transport = default_transport();
        }

        if matches!(self.api.as_deref(), Some(api) if api.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.api", name),
                message: "api host cannot be empty when set".to_string(),
            });
        }

        // Empty strings in YAML mean "not configured"
        self.user = self.user.filter(|user| !user.is_empty());
        self.pass = self.pass.filter(|pass| !pass.is_empty());

        if let Some(var) = self.pass_env.take() {
            if self.pass.is_some() {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.pass_env", name),
                    message: "pass and pass_env cannot both be set".to_string(),
                });
            }

            let pass = std::env::var(&var).map_err(|_| ConfigError::PasswordEnvMissing {
                field: format!("{}.pass_env", name),
                var: var.clone(),
            })?;
            self.pass = Some(pass).filter(|pass| !pass.is_empty());
        }

        if self.pass.is_some() && self.user.is_none() {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.pass", name),
                message: "a password requires a user".to_string(),
            });
        }

        Ok(self)
    }

    pub fn is_insecure(&self) -> bool {
        !self.ssl
    }

    /// Host used for the catalog API call
    pub fn api_host(&self) -> &str {
        self.api.as_deref().unwrap_or(&self.host)
    }

    /// Credentials in `user` or `user:pass` form
    pub fn credentials(&self) -> Option<String> {
        let user = self.user.as_deref()?;
        Some(match self.pass.as_deref() {
            Some(pass) => format!("{}:{}", user, pass),
            None => user.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(yaml: &str) -> Result<MirrorConfig, ConfigError> {
        let config: MirrorConfig = serde_yaml::from_str(yaml).unwrap();
        config.resolve()
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse("src: {host: a.example.com}\ndest: {host: b.example.com}\n").unwrap();
        assert_eq!(config.src.transport, "docker");
        assert_eq!(config.dest.transport, "docker");
        assert!(config.src.ssl);
        assert!(config.dest.ssl);
        assert!(!config.any_insecure());
        assert!(config.src.credentials().is_none());
    }

    #[test]
    fn test_empty_transport_falls_back_to_default() {
        let config =
            parse("src: {host: a, transport: ''}\ndest: {host: b, transport: oci}\n").unwrap();
        assert_eq!(config.src.transport, "docker");
        assert_eq!(config.dest.transport, "oci");
    }

    #[test]
    fn test_insecure_hosts_source_first() {
        let config = parse("src: {host: a, ssl: false}\ndest: {host: b, ssl: false}\n").unwrap();
        assert_eq!(config.insecure_hosts(), vec!["a", "b"]);

        let config = parse("src: {host: a}\ndest: {host: b, ssl: false}\n").unwrap();
        assert_eq!(config.insecure_hosts(), vec!["b"]);
    }

    #[test]
    fn test_api_host_override() {
        let config = parse("src: {host: a, api: api.a}\ndest: {host: b}\n").unwrap();
        assert_eq!(config.src.api_host(), "api.a");
        assert_eq!(config.dest.api_host(), "b");
    }

    #[test]
    fn test_credentials_forms() {
        let config =
            parse("src: {host: a, user: alice}\ndest: {host: b, user: bob, pass: s3cret}\n")
                .unwrap();
        assert_eq!(config.src.credentials().as_deref(), Some("alice"));
        assert_eq!(config.dest.credentials().as_deref(), Some("bob:s3cret"));
    }

    #[test]
    fn test_empty_user_means_no_credentials() {
        let config = parse("src: {host: a, user: ''}\ndest: {host: b}\n").unwrap();
        assert!(config.src.credentials().is_none());
    }

    #[test]
    fn test_pass_env_resolved() {
        std::env::set_var("REGISTRY_MIRROR_TEST_PASS", "from-env");
        let config = parse(
            "src: {host: a}\ndest: {host: b, user: bob, pass_env: REGISTRY_MIRROR_TEST_PASS}\n",
        )
        .unwrap();
        assert_eq!(config.dest.credentials().as_deref(), Some("bob:from-env"));
        assert!(config.dest.pass_env.is_none());
        std::env::remove_var("REGISTRY_MIRROR_TEST_PASS");
    }

    #[test]
    fn test_pass_env_missing() {
        std::env::remove_var("REGISTRY_MIRROR_TEST_UNSET");
        let err = parse(
            "src: {host: a, user: u, pass_env: REGISTRY_MIRROR_TEST_UNSET}\ndest: {host: b}\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::PasswordEnvMissing { .. }));
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            parse("src: {host: ''}\ndest: {host: b}\n").unwrap_err(),
            ConfigError::MissingField { .. }
        ));
        assert!(matches!(
            parse("src: {host: a, pass: x}\ndest: {host: b}\n").unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
        assert!(matches!(
            parse("src: {host: a, api: ' '}\ndest: {host: b}\n").unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
        assert!(matches!(
            parse("src: {host: a, user: u, pass: x, pass_env: Y}\ndest: {host: b}\n").unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "src:\n  host: src.example.com\n  ssl: false\ndest:\n  host: dest.example.com").unwrap();

        let config = MirrorConfig::load(file.path()).unwrap();
        assert_eq!(config.src.host, "src.example.com");
        assert!(config.src.is_insecure());
        assert!(!config.dest.is_insecure());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MirrorConfig::load(&dir.path().join("config.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "src: [not, a, mapping]").unwrap();

        let err = MirrorConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
