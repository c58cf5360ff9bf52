use crate::index::PackageIndexProvider;
use crate::RuntimeError;
use pru_schema::Snapshot;
use std::sync::Mutex;

/// In-memory package index for tests.
///
/// `install` mutates the backing list, so a test can simulate a package
/// manager run between two snapshots.
#[derive(Default)]
pub struct StaticIndex {
    packages: Mutex<Vec<(String, Option<String>)>>,
}

impl StaticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_packages<'a>(packages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let index = Self::new();
        for (name, version) in packages {
            index.install(name, Some(version));
        }
        index
    }

    /// Add a package, or replace the version of one already present.
    pub fn install(&self, name: &str, version: Option<&str>) {
        let mut packages = self
            .packages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let version = version.map(str::to_owned);
        if let Some(entry) = packages.iter_mut().find(|(n, _)| n == name) {
            entry.1 = version;
        } else {
            packages.push((name.to_owned(), version));
        }
    }
}

impl PackageIndexProvider for StaticIndex {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn snapshot(&self) -> Result<Snapshot, RuntimeError> {
        let packages = self
            .packages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(Snapshot::from_pairs(packages.iter().cloned()))
    }
}
