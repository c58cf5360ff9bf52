//! Upgrade and pin workflows for pru.
//!
//! This crate ties the manifest layer and the environment layer together into
//! the `Engine`: showing installed versions for a manifest, pinning installed
//! versions into it, upgrading its packages, and the combined
//! upgrade-then-pin run. `PruConfig` carries the settings every workflow
//! reads, loaded from TOML and overridden from the command line.

pub mod config;
pub mod engine;

pub use config::{default_config_path, PruConfig};
pub use engine::{
    Engine, InstalledReport, PinOptions, PinResult, RequirementStatus, UpgradeResult,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] pru_schema::ManifestError),
    #[error(transparent)]
    Runtime(#[from] pru_runtime::RuntimeError),
    #[error("config error: {0}")]
    Config(String),
}
