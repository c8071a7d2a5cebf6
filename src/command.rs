//! `skopeo sync` invocation building
//!
//! The flags shared by every repository (declaration file, credentials, TLS
//! verification and transports) are computed once at startup into a
//! [`SyncCommand`]. Each repository then only appends its source and
//! destination references. Arguments stay discrete tokens and are never
//! passed through a shell.

use std::fmt;
use std::path::Path;

use crate::config::MirrorConfig;
use crate::error::CommandError;

/// Credential flags whose values are masked when rendered for logs
const CREDENTIAL_FLAGS: &[&str] = &["--src-creds=", "--dest-creds="];

/// Program plus the argument prefix shared by every repository
#[derive(Debug, Clone, PartialEq)]
pub struct SyncCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SyncCommand {
    /// Build the shared `sync` arguments for the configured registries
    ///
    /// When either registry is insecure the declaration at `declaration_path`
    /// must already exist.
    pub fn prepare(
        config: &MirrorConfig,
        declaration_path: &Path,
        program: impl Into<String>,
    ) -> Result<Self, CommandError> {
        let mut args = vec!["sync".to_string()];

        if config.any_insecure() {
            if !declaration_path.exists() {
                return Err(CommandError::MissingDeclaration {
                    path: declaration_path.to_path_buf(),
                });
            }
            args.push(format!("--registries-conf={}", declaration_path.display()));
        }

        if let Some(creds) = config.src.credentials() {
            args.push(format!("--src-creds={}", creds));
        }
        if let Some(creds) = config.dest.credentials() {
            args.push(format!("--dest-creds={}", creds));
        }

        if config.src.is_insecure() {
            args.push("--src-tls-verify=false".to_string());
        }
        if config.dest.is_insecure() {
            args.push("--dest-tls-verify=false".to_string());
        }

        args.extend([
            "--src".to_string(),
            config.src.transport.clone(),
            "--dest".to_string(),
            config.dest.transport.clone(),
        ]);

        Ok(Self {
            program: program.into(),
            args,
        })
    }

    /// Full invocation for one repository
    pub fn invocation(&self, source: String, destination: String) -> Invocation {
        let mut args = self.args.clone();
        args.push(source);
        args.push(destination);

        Invocation {
            program: self.program.clone(),
            args,
        }
    }
}

/// A single, fully resolved sync tool invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Renders the command line with passwords masked
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", redact(arg))?;
        }
        Ok(())
    }
}

fn redact(arg: &str) -> std::borrow::Cow<'_, str> {
    for flag in CREDENTIAL_FLAGS {
        if let Some(value) = arg.strip_prefix(flag) {
            if let Some((user, _)) = value.split_once(':') {
                return format!("{}{}:***", flag, user).into();
            }
        }
    }
    arg.into()
}

/// Destination sub-path for a repository: everything but the image name
///
/// `org/team/app` mirrors into `org/team`, so skopeo recreates `app` beneath
/// it. A repository without a slash is used as is.
pub fn destination_path(repository: &str) -> &str {
    match repository.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => repository,
    }
}
