//! Insecure registries declaration
//!
//! skopeo only talks plain HTTP to registries listed under
//! `[registries.insecure]` in a registries.conf file. When either endpoint has
//! `ssl: false` we write that file once at startup and reference it from every
//! sync invocation.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::MirrorConfig;
use crate::error::DeclarationError;

/// Location of the declaration handed to skopeo via `--registries-conf`
pub const DEFAULT_DECLARATION_PATH: &str = "./registry.conf";

/// Write the declaration for every insecure endpoint (idempotent)
///
/// Returns `false` without touching the filesystem when both endpoints use TLS.
pub fn declare_insecure_registries(
    config: &MirrorConfig,
    path: &Path,
) -> Result<bool, DeclarationError> {
    let hosts = config.insecure_hosts();
    if hosts.is_empty() {
        debug!("Both registries use TLS, no registries declaration needed");
        return Ok(false);
    }

    fs::write(path, render_declaration(&hosts)).map_err(|source| DeclarationError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "✓ Declared insecure registries [{}] in {}",
        hosts.join(", "),
        path.display()
    );
    Ok(true)
}

/// Render the registries.conf body for the given hosts
pub fn render_declaration(hosts: &[&str]) -> String {
    let quoted: Vec<String> = hosts.iter().map(|host| format!("'{}'", host)).collect();
    format!(
        "[registries.insecure]\nregistries = [{}]\n",
        quoted.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    fn endpoint(host: &str, ssl: bool) -> EndpointConfig {
        EndpointConfig {
            host: host.to_string(),
            user: None,
            pass: None,
            pass_env: None,
            transport: "docker".to_string(),
            ssl,
            api: None,
        }
    }

    fn mirror(src_ssl: bool, dest_ssl: bool) -> MirrorConfig {
        MirrorConfig {
            src: endpoint("src.local:5000", src_ssl),
            dest: endpoint("dest.local:5000", dest_ssl),
        }
    }

    #[test]
    fn test_render_single_host() {
        assert_eq!(
            render_declaration(&["reg:5000"]),
            "[registries.insecure]\nregistries = ['reg:5000']\n"
        );
    }

    #[test]
    fn test_render_two_hosts() {
        assert_eq!(
            render_declaration(&["a", "b"]),
            "[registries.insecure]\nregistries = ['a', 'b']\n"
        );
    }

    #[test]
    fn test_declaration_for_every_tls_combination() {
        let cases = [
            (true, true, None),
            (false, true, Some("registries = ['src.local:5000']")),
            (true, false, Some("registries = ['dest.local:5000']")),
            (
                false,
                false,
                Some("registries = ['src.local:5000', 'dest.local:5000']"),
            ),
        ];

        for (src_ssl, dest_ssl, expected) in cases {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("registry.conf");

            let written = declare_insecure_registries(&mirror(src_ssl, dest_ssl), &path).unwrap();
            assert_eq!(written, expected.is_some());
            assert_eq!(path.exists(), expected.is_some());

            if let Some(line) = expected {
                let content = fs::read_to_string(&path).unwrap();
                assert_eq!(content, format!("[registries.insecure]\n{}\n", line));
            }
        }
    }

    #[test]
    fn test_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("registry.conf");

        let err = declare_insecure_registries(&mirror(false, true), &path).unwrap_err();
        assert!(matches!(err, DeclarationError::Write { .. }));
    }
}
