//! Runtime tool path resolution
//!
//! For each external tool (e.g. `skopeo`) we check an environment variable
//! `{TOOL}_BIN` (e.g. `SKOPEO_BIN`) and fall back to PATH-based invocation when
//! it is not set. Container images can pin the exact binary this way while
//! local runs keep working off PATH.

use std::env;
use tracing::{debug, warn};

/// Tool used to mirror repositories
pub const SKOPEO: &str = "skopeo";

/// Get the path to an external tool
///
/// Returns the value of `{TOOL}_BIN` (uppercase tool name) if set, otherwise
/// the tool name itself.
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase());
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}

/// Log whether `program` can be found, without failing
///
/// The sync tool is only needed once the first repository is mirrored, so a
/// missing binary surfaces as per-repository failures rather than a startup
/// error.
pub fn check_available(program: &str) -> bool {
    match which::which(program) {
        Ok(path) => {
            debug!("Using {} at {}", program, path.display());
            true
        }
        Err(e) => {
            warn!("{} not found ({}); every sync invocation will fail", program, e);
            false
        }
    }
}
