use std::fs;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Core fields of a distribution's metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parse the header block of a `METADATA` / `PKG-INFO` file.
///
/// Only the RFC 822 style head is inspected; parsing stops at the first blank
/// line, where the long description begins.
pub fn parse_metadata(text: &str) -> DistMetadata {
    let mut meta = DistMetadata::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if key.eq_ignore_ascii_case("name") && meta.name.is_none() {
            meta.name = Some(value.to_owned());
        } else if key.eq_ignore_ascii_case("version") && meta.version.is_none() {
            meta.version = Some(value.to_owned());
        }
        if meta.name.is_some() && meta.version.is_some() {
            break;
        }
    }
    meta
}

/// Metadata file for a search-path entry, if the entry is a distribution.
///
/// Recognizes `*.dist-info/METADATA`, `*.egg-info/PKG-INFO` and single-file
/// `*.egg-info`.
pub fn metadata_file(entry: &Path) -> Option<PathBuf> {
    let file_name = entry.file_name()?.to_str()?;
    if file_name.ends_with(".dist-info") && entry.is_dir() {
        Some(entry.join("METADATA"))
    } else if file_name.ends_with(".egg-info") {
        if entry.is_dir() {
            Some(entry.join("PKG-INFO"))
        } else {
            Some(entry.to_path_buf())
        }
    } else {
        None
    }
}

/// Project name encoded in a metadata directory name, e.g. `foo_bar` from
/// `foo_bar-1.0.dist-info`.
fn name_from_dir(entry: &Path) -> Option<String> {
    let stem = entry.file_stem()?.to_str()?;
    let name = stem.split_once('-').map_or(stem, |(name, _)| name);
    (!name.is_empty()).then(|| name.to_owned())
}

/// Read one distribution's `(name, version)`.
///
/// An unreadable metadata file degrades to the name from the directory and no
/// version. Returns `None` when no name can be determined at all.
pub fn read_distribution(entry: &Path) -> Option<(String, Option<String>)> {
    let file = metadata_file(entry)?;
    match fs::read(&file) {
        Ok(bytes) => {
            let meta = parse_metadata(&String::from_utf8_lossy(&bytes));
            let Some(name) = meta.name.or_else(|| name_from_dir(entry)) else {
                warn!("skipping {}: metadata has no Name", entry.display());
                return None;
            };
            if meta.version.is_none() {
                warn!("{name}: metadata in {} has no Version", file.display());
            }
            trace!("found {name} {:?} in {}", meta.version, entry.display());
            Some((name, meta.version))
        }
        Err(e) => {
            warn!("cannot read {}: {e}", file.display());
            name_from_dir(entry).map(|name| (name, None))
        }
    }
}
