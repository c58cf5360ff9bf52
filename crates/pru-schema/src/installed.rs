use crate::normalize::NormalizedName;
use serde::Serialize;
use std::collections::HashMap;

/// One distribution as reported by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    /// Name exactly as the environment spells it.
    pub name: String,
    /// `None` when the distribution's metadata could not supply a version.
    pub version: Option<String>,
}

/// Installed packages captured at one point in time.
///
/// Entries keep the order they were discovered in. Lookups go through the
/// normalized name, so `Some-Package`, `some_package` and `some.package`
/// resolve to the same entry. When two distributions share a key, the first
/// one inserted shadows the later ones.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    packages: Vec<InstalledPackage>,
    by_key: HashMap<NormalizedName, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(name, version)` pairs in discovery order.
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, Option<V>)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut snapshot = Self::new();
        for (name, version) in pairs {
            snapshot.insert(name, version.map(Into::into));
        }
        snapshot
    }

    /// Record a distribution. Returns `false` if an earlier entry with the
    /// same normalized name already shadows it.
    pub fn insert(&mut self, name: impl Into<String>, version: Option<String>) -> bool {
        let name = name.into();
        let key = NormalizedName::new(&name);
        if self.by_key.contains_key(&key) {
            return false;
        }
        self.by_key.insert(key, self.packages.len());
        self.packages.push(InstalledPackage { name, version });
        true
    }

    pub fn get(&self, name: &str) -> Option<&InstalledPackage> {
        let key = NormalizedName::new(name);
        self.by_key.get(&key).map(|&idx| &self.packages[idx])
    }

    /// Installed version for `name`, matched by normalized name.
    pub fn version(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|pkg| pkg.version.as_deref())
    }

    /// The environment's own spelling of `name`.
    pub fn original_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(|pkg| pkg.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
