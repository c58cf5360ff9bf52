use crate::index::{IndexConfig, PackageIndexProvider};
use crate::metadata::read_distribution;
use crate::RuntimeError;
use pru_schema::Snapshot;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const SYS_PATH_SCRIPT: &str = "import json, sys; print(json.dumps(sys.path))";

/// Package index of a live Python environment.
///
/// Distributions are discovered the way the interpreter's own metadata
/// machinery finds them: every directory on `sys.path`, in order, is scanned
/// for `*.dist-info` and `*.egg-info` entries.
pub struct EnvironmentIndex {
    config: IndexConfig,
}

impl EnvironmentIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Directories to scan, in precedence order.
    pub fn search_path(&self) -> Result<Vec<PathBuf>, RuntimeError> {
        if !self.config.site_packages.is_empty() {
            return Ok(self.config.site_packages.clone());
        }
        interpreter_sys_path(&self.config.python)
    }
}

fn interpreter_sys_path(python: &str) -> Result<Vec<PathBuf>, RuntimeError> {
    debug!("querying sys.path from {python}");
    let output = Command::new(python)
        .args(["-c", SYS_PATH_SCRIPT])
        .output()
        .map_err(|e| RuntimeError::Interpreter {
            python: python.to_owned(),
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(RuntimeError::Interpreter {
            python: python.to_owned(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    parse_sys_path(&String::from_utf8_lossy(&output.stdout)).map_err(|e| {
        RuntimeError::Interpreter {
            python: python.to_owned(),
            detail: format!("unexpected sys.path output: {e}"),
        }
    })
}

/// Parse the JSON list printed by the interpreter. An empty entry stands for
/// the working directory.
fn parse_sys_path(stdout: &str) -> Result<Vec<PathBuf>, serde_json::Error> {
    let entries: Vec<String> = serde_json::from_str(stdout.trim())?;
    Ok(entries
        .into_iter()
        .map(|entry| {
            if entry.is_empty() {
                PathBuf::from(".")
            } else {
                PathBuf::from(entry)
            }
        })
        .collect())
}

/// Add every distribution under `dir` to `snapshot`, sorted by entry name.
fn scan_dir(dir: &Path, snapshot: &mut Snapshot) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        if let Some((name, version)) = read_distribution(&path) {
            if !snapshot.insert(name.as_str(), version) {
                debug!("{name} in {} is shadowed by an earlier entry", dir.display());
            }
        }
    }
}

impl PackageIndexProvider for EnvironmentIndex {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn snapshot(&self) -> Result<Snapshot, RuntimeError> {
        let mut snapshot = Snapshot::new();
        for dir in self.search_path()? {
            if dir.is_dir() {
                scan_dir(&dir, &mut snapshot);
            }
        }
        info!("found {} installed packages", snapshot.len());
        Ok(snapshot)
    }
}
