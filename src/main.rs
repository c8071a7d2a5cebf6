//! registry-mirror
//!
//! Keeps a destination container registry in sync with a source registry:
//! - Lists the source catalog (`/v2/_catalog`)
//! - Runs `skopeo sync` once per repository, in catalog order
//! - Sleeps for `INTERVAL` seconds and starts over
//!
//! A failing repository is logged and skipped. Startup problems (unreadable
//! config, missing registries declaration, invalid interval) are fatal.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;

mod catalog;
mod cli;
mod command;
mod config;
mod declaration;
mod driver;
mod error;
mod tools;

use catalog::CatalogClient;
use cli::Cli;
use command::SyncCommand;
use config::{EndpointConfig, MirrorConfig};
use driver::{LoopOptions, SyncDriver};
use error::MirrorError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // LOGGING=debug or LOG_LEVEL=debug, RUST_LOG style directives also work
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_ansi(false)
        .init();

    let config_path = cli.config.display().to_string();
    let result = run(cli).await.with_context(|| {
        format!("registry-mirror stopped (config: {})", config_path)
    });

    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }

    result
}

async fn run(cli: Cli) -> Result<(), MirrorError> {
    info!("Loading configuration from: {}", cli.config.display());
    let config = MirrorConfig::load(&cli.config)?;
    log_endpoint("Source", &config.src);
    log_endpoint("Destination", &config.dest);

    declaration::declare_insecure_registries(&config, &cli.registries_conf)?;

    let program = tools::get_tool_path(tools::SKOPEO);
    tools::check_available(&program);
    let command = SyncCommand::prepare(&config, &cli.registries_conf, program)?;

    let catalog = CatalogClient::new(Duration::from_secs(cli.http_timeout))?;
    let driver = SyncDriver::new(&config, command, catalog);

    if cli.dry_run {
        print_plan(&config, &driver).await?;
        return Ok(());
    }

    let options = LoopOptions {
        interval: Duration::from_secs(cli.interval),
        on_catalog_error: cli.on_catalog_error,
        once: cli.once,
    };
    info!(
        "Mirroring every {} (on catalog error: {:?})",
        humantime::format_duration(options.interval),
        options.on_catalog_error
    );

    driver.run(&options).await?;
    Ok(())
}

fn log_endpoint(role: &str, endpoint: &EndpointConfig) {
    info!(
        "{} registry: {} (transport: {}, tls: {}, catalog api: {}, user: {})",
        role,
        endpoint.host,
        endpoint.transport,
        endpoint.ssl,
        endpoint.api_host(),
        endpoint.user.as_deref().unwrap_or("-")
    );
}

async fn print_plan(config: &MirrorConfig, driver: &SyncDriver<'_>) -> Result<(), MirrorError> {
    let plan = driver.plan().await?;

    println!("\nRegistry Mirror Plan:");
    println!("=====================\n");
    println!("Source:      {}", config.src.host);
    println!("Destination: {}", config.dest.host);

    println!("\nCommands to run ({}):", plan.len());
    for invocation in &plan {
        println!("  {}", invocation);
    }

    println!();
    Ok(())
}
