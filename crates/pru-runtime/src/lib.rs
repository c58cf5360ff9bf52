//! Environment access for pru.
//!
//! This crate implements everything that touches the Python environment or
//! spawns processes: the `PackageIndexProvider` trait with the
//! `EnvironmentIndex` implementation (interpreter search path + `*.dist-info` /
//! `*.egg-info` metadata scanning), a static `mock` index for tests, the
//! streaming upgrade invoker, and package manager discovery.

pub mod environment;
pub mod index;
pub mod metadata;
pub mod mock;
pub mod prereq;
pub mod upgrade;

pub use environment::EnvironmentIndex;
pub use index::{IndexConfig, PackageIndexProvider};
pub use prereq::{
    check_upgrade_prereqs, command_exists, default_upgrade_command, format_missing, MissingPrereq,
};
pub use upgrade::{run_streaming, upgrade_command_line, UpgradeOutcome};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("python interpreter '{python}' failed: {detail}")]
    Interpreter { python: String, detail: String },
    #[error("upgrade command must not be empty")]
    EmptyCommand,
    #[error("upgrade failed: '{command}' exited with {}", exit_description(.code))]
    UpgradeFailed { command: String, code: Option<i32> },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_owned(),
    }
}
