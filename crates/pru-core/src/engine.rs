use crate::config::PruConfig;
use crate::CoreError;
use pru_runtime::{
    run_streaming, upgrade_command_line, EnvironmentIndex, PackageIndexProvider, UpgradeOutcome,
};
use pru_schema::{
    pin_versions, write_manifest_atomic, InstalledPackage, Manifest, ManifestSource,
    RewriteReport, Snapshot,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

/// Entry point for every pru workflow.
///
/// Holds the configuration and the package index the workflows query. Each
/// workflow takes at most one snapshot of the environment after any upgrade
/// has finished, and never caches it across calls.
pub struct Engine {
    config: PruConfig,
    index: Box<dyn PackageIndexProvider>,
}

#[derive(Debug, Clone, Default)]
pub struct PinOptions {
    /// Write here instead of overwriting the manifest.
    pub output: Option<PathBuf>,
    /// Compute the rewrite but do not write anything.
    pub check: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequirementStatus {
    pub name: String,
    pub installed: Option<String>,
}

/// Installed versions for a manifest plus the whole environment, from one
/// snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct InstalledReport {
    pub requirements: Vec<RequirementStatus>,
    pub installed: Vec<InstalledPackage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PinResult {
    pub report: RewriteReport,
    pub changed: bool,
    /// Destination written, `None` in check mode or without a manifest.
    pub written_to: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeResult {
    /// `None` when the manifest named no packages.
    pub upgrade: Option<UpgradeOutcome>,
    pub pin: PinResult,
}

impl Engine {
    pub fn new(config: PruConfig) -> Self {
        let index = EnvironmentIndex::new(config.index_config());
        Self::with_index(config, Box::new(index))
    }

    pub fn with_index(config: PruConfig, index: Box<dyn PackageIndexProvider>) -> Self {
        Self { config, index }
    }

    pub fn config(&self) -> &PruConfig {
        &self.config
    }

    /// Every package installed in the environment.
    pub fn installed(&self) -> Result<Snapshot, CoreError> {
        Ok(self.index.snapshot()?)
    }

    pub fn package_version(&self, name: &str) -> Option<String> {
        self.index.version(name)
    }

    /// Installed version of each requirement in the manifest, in manifest order.
    pub fn requirement_versions(
        &self,
        source: &ManifestSource,
    ) -> Result<Vec<RequirementStatus>, CoreError> {
        let manifest = source.load()?;
        if manifest.requirements().next().is_none() {
            return Ok(Vec::new());
        }
        let snapshot = self.installed()?;
        Ok(requirement_statuses(&manifest, &snapshot))
    }

    /// Everything `print-installed` shows.
    pub fn installed_report(&self, source: &ManifestSource) -> Result<InstalledReport, CoreError> {
        let manifest = source.load()?;
        let snapshot = self.installed()?;
        Ok(InstalledReport {
            requirements: requirement_statuses(&manifest, &snapshot),
            installed: snapshot.iter().cloned().collect(),
        })
    }

    /// Pin every installed requirement to its installed version.
    pub fn replace_versions(
        &self,
        source: &ManifestSource,
        options: &PinOptions,
    ) -> Result<PinResult, CoreError> {
        let manifest = source.load()?;
        self.pin(source, &manifest, options)
    }

    /// Run the upgrade command on the manifest's packages without rewriting
    /// the manifest.
    pub fn upgrade_installed(
        &self,
        source: &ManifestSource,
        sink: &mut dyn Write,
    ) -> Result<Option<UpgradeOutcome>, CoreError> {
        let manifest = source.load()?;
        self.upgrade(&manifest, sink)
    }

    /// Upgrade the manifest's packages, then pin the versions installed
    /// afterwards.
    pub fn upgrade_requirements(
        &self,
        source: &ManifestSource,
        options: &PinOptions,
        sink: &mut dyn Write,
    ) -> Result<UpgradeResult, CoreError> {
        let manifest = source.load()?;
        let upgrade = self.upgrade(&manifest, sink)?;
        let pin = self.pin(source, &manifest, options)?;
        Ok(UpgradeResult { upgrade, pin })
    }

    fn upgrade(
        &self,
        manifest: &Manifest,
        sink: &mut dyn Write,
    ) -> Result<Option<UpgradeOutcome>, CoreError> {
        let packages = manifest.package_names();
        if packages.is_empty() {
            info!("no packages to upgrade");
            return Ok(None);
        }

        let command = upgrade_command_line(&self.config.upgrade_command(), &packages);
        let outcome = run_streaming(&command, sink)?;
        if outcome.success() {
            return Ok(Some(outcome));
        }
        if self.config.allow_upgrade_failure {
            warn!(
                "'{}' exited with {:?}; pinning installed versions anyway",
                outcome.command, outcome.status_code
            );
            Ok(Some(outcome))
        } else {
            Ok(Some(outcome.into_result()?))
        }
    }

    fn pin(
        &self,
        source: &ManifestSource,
        manifest: &Manifest,
        options: &PinOptions,
    ) -> Result<PinResult, CoreError> {
        let Some(input_path) = source.path() else {
            info!("no manifest given, nothing to pin");
            return Ok(PinResult {
                report: RewriteReport::default(),
                changed: false,
                written_to: None,
            });
        };

        let snapshot = self.installed()?;
        let rewritten = pin_versions(manifest, &snapshot);
        info!(
            "pinned {} of {} requirements",
            rewritten.report.pinned.len(),
            rewritten.report.pinned.len() + rewritten.report.unresolved.len()
        );

        let written_to = if options.check {
            None
        } else {
            let dest = options
                .output
                .clone()
                .unwrap_or_else(|| input_path.to_path_buf());
            write_manifest_atomic(&dest, &rewritten.manifest.to_text())?;
            Some(dest)
        };

        Ok(PinResult {
            report: rewritten.report,
            changed: rewritten.changed,
            written_to,
        })
    }
}

fn requirement_statuses(manifest: &Manifest, snapshot: &Snapshot) -> Vec<RequirementStatus> {
    manifest
        .requirements()
        .map(|req| RequirementStatus {
            name: req.name.to_owned(),
            installed: snapshot.version(req.name).map(str::to_owned),
        })
        .collect()
}
