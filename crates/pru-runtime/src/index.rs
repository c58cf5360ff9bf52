use crate::RuntimeError;
use pru_schema::Snapshot;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_PYTHON: &str = "python3";

/// How to locate the installed packages of an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Interpreter whose `sys.path` is scanned.
    pub python: String,
    /// Explicit directories to scan. When non-empty the interpreter is not run.
    pub site_packages: Vec<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_owned(),
            site_packages: Vec::new(),
        }
    }
}

/// Read access to the packages installed in an environment.
pub trait PackageIndexProvider {
    fn name(&self) -> &str;

    /// Enumerate every visible distribution. Each call takes a fresh look at
    /// the environment; a returned `Snapshot` is never updated afterwards.
    fn snapshot(&self) -> Result<Snapshot, RuntimeError>;

    /// Installed version of a single package.
    ///
    /// Not installed and failed lookups both yield `None`.
    fn version(&self, package: &str) -> Option<String> {
        match self.snapshot() {
            Ok(snapshot) => snapshot.version(package).map(str::to_owned),
            Err(e) => {
                warn!("{} index lookup for {package} failed: {e}", self.name());
                None
            }
        }
    }
}
