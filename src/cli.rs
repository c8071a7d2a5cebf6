use clap::Parser;
use std::path::PathBuf;

use crate::declaration::DEFAULT_DECLARATION_PATH;
use crate::driver::CatalogFailurePolicy;

/// Mirror every repository of a source registry into a destination registry
#[derive(Parser, Debug)]
#[command(name = "registry-mirror")]
#[command(
    about = "Mirror every repository of a source container registry into a destination registry",
    long_about = "Lists the source registry catalog and runs `skopeo sync` once per repository, \
    then sleeps for the configured interval and starts over.\n\n\
    A repository `org/team/app` is mirrored to `<dest host>/org/team`."
)]
#[command(version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(long, env = "CONFIG", default_value = "./config.yml")]
    pub config: PathBuf,

    /// Seconds to sleep between mirror cycles
    #[arg(long, env = "INTERVAL", default_value_t = 86400)]
    pub interval: u64,

    /// Where the insecure registries declaration is written
    #[arg(long, env = "REGISTRIES_CONF", default_value = DEFAULT_DECLARATION_PATH)]
    pub registries_conf: PathBuf,

    /// Timeout for the catalog request, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout: u64,

    /// What to do when the source catalog cannot be listed
    #[arg(long, env = "ON_CATALOG_ERROR", value_enum, default_value_t = CatalogFailurePolicy::Exit)]
    pub on_catalog_error: CatalogFailurePolicy,

    /// Run a single cycle and exit
    #[arg(long, env = "ONCE")]
    pub once: bool,

    /// Print the sync commands for the current catalog without running them
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
