//! Mirror poll loop
//!
//! Each cycle lists the source catalog and runs one `skopeo sync` per
//! repository, strictly in catalog order. A failing repository is logged and
//! skipped; a failing catalog query ends the cycle and, depending on
//! [`CatalogFailurePolicy`], the process.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::catalog::CatalogClient;
use crate::command::{destination_path, Invocation, SyncCommand};
use crate::config::MirrorConfig;
use crate::error::{CatalogError, SyncError};

/// What to do when the source catalog cannot be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CatalogFailurePolicy {
    /// Terminate the process
    Exit,
    /// Log the failure and try again after the next interval
    Skip,
}

/// Scheduling options for [`SyncDriver::run`]
#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub interval: Duration,
    pub on_catalog_error: CatalogFailurePolicy,
    /// Stop after the first cycle
    pub once: bool,
}

/// Outcome of one mirror cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    pub synced: Vec<String>,
    pub failed: Vec<String>,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn attempted(&self) -> usize {
        self.synced.len() + self.failed.len()
    }
}

/// Drives `skopeo sync` for every repository of the source registry
pub struct SyncDriver<'a> {
    config: &'a MirrorConfig,
    command: SyncCommand,
    catalog: CatalogClient,
}

impl<'a> SyncDriver<'a> {
    pub fn new(config: &'a MirrorConfig, command: SyncCommand, catalog: CatalogClient) -> Self {
        Self {
            config,
            command,
            catalog,
        }
    }

    /// Invocation mirroring `repository` into its parent path on the destination
    pub fn invocation_for(&self, repository: &str) -> Invocation {
        self.command.invocation(
            format!("{}/{}", self.config.src.host, repository),
            format!("{}/{}", self.config.dest.host, destination_path(repository)),
        )
    }

    /// Invocations the next cycle would run, without running them
    pub async fn plan(&self) -> Result<Vec<Invocation>, CatalogError> {
        let repositories = self.catalog.list_repositories(&self.config.src).await?;
        Ok(repositories
            .iter()
            .map(|repository| self.invocation_for(repository))
            .collect())
    }

    /// Mirror a single repository, returning the tool's standard output
    pub async fn sync_repository(&self, repository: &str) -> Result<String, SyncError> {
        let invocation = self.invocation_for(repository);

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SyncError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(SyncError::Invocation {
                command: invocation.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// List the catalog and sync every repository once
    pub async fn run_cycle(&self) -> Result<CycleReport, CatalogError> {
        let started = Instant::now();
        let repositories = self.catalog.list_repositories(&self.config.src).await?;
        info!("Following repositories will be synced: {:?}", repositories);

        let mut report = CycleReport::default();
        for repository in repositories {
            info!("Syncing repository {}", repository);
            match self.sync_repository(&repository).await {
                Ok(stdout) => {
                    let stdout = stdout.trim();
                    if !stdout.is_empty() {
                        info!("{}", stdout);
                    }
                    report.synced.push(repository);
                }
                Err(e) => {
                    error!("Unable to sync repository {}: {}", repository, e);
                    report.failed.push(repository);
                }
            }
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    /// Run cycles forever, sleeping `interval` between them
    ///
    /// Only returns on a catalog failure under [`CatalogFailurePolicy::Exit`],
    /// or after the first cycle when `once` is set.
    pub async fn run(&self, options: &LoopOptions) -> Result<(), CatalogError> {
        loop {
            let result = self.run_cycle().await;
            let outcome = settle_cycle(result, options);

            if options.once || outcome.is_err() {
                return outcome;
            }

            info!(
                "Finished, sleeping for {}",
                humantime::format_duration(options.interval)
            );
            tokio::time::sleep(options.interval).await;
        }
    }
}

/// Log a cycle outcome and decide whether its catalog error is fatal
fn settle_cycle(
    result: Result<CycleReport, CatalogError>,
    options: &LoopOptions,
) -> Result<(), CatalogError> {
    match result {
        Ok(report) => {
            let summary = format!(
                "Cycle complete: {} repositories attempted, {} synced, {} failed in {}",
                report.attempted(),
                report.synced.len(),
                report.failed.len(),
                humantime::format_duration(Duration::from_secs(report.elapsed.as_secs()))
            );
            if report.failed.is_empty() {
                info!("{}", summary);
            } else {
                warn!("{} (failed: {})", summary, report.failed.join(", "));
            }
            Ok(())
        }
        Err(e) if options.on_catalog_error == CatalogFailurePolicy::Skip && !options.once => {
            error!("Unable to get source repository list: {}", e);
            warn!("Retrying after the next interval");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
