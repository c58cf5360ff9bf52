use crate::installed::Snapshot;
use crate::manifest::Manifest;
use crate::requirement::ParsedLine;
use serde::Serialize;
use tracing::debug;

/// A requirement line that was pinned to the installed version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinnedEntry {
    /// 1-based line number in the manifest.
    pub line: usize,
    /// Name as spelled in the manifest.
    pub name: String,
    /// Constraint written before the rewrite, e.g. `>=1.0`.
    pub previous: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    pub pinned: Vec<PinnedEntry>,
    /// Requirement names with no installed version, left untouched.
    pub unresolved: Vec<String>,
}

impl RewriteReport {
    /// Entries whose constraint actually changed.
    pub fn updated(&self) -> impl Iterator<Item = &PinnedEntry> {
        self.pinned.iter().filter(|entry| {
            entry.previous.as_deref().map(|p| p.strip_prefix("=="))
                != Some(Some(entry.version.as_str()))
        })
    }
}

pub struct Rewritten {
    pub manifest: Manifest,
    pub report: RewriteReport,
    /// Whether any line differs from the input.
    pub changed: bool,
}

/// Pin every installed requirement in `manifest` to its installed version.
///
/// A requirement whose normalized name has a version in `snapshot` becomes
/// `<manifest name>==<version><trailing>`; every other line is copied
/// unchanged. Lines are resolved independently, so the output always has the
/// same number of lines in the same order as the input.
pub fn pin_versions(manifest: &Manifest, snapshot: &Snapshot) -> Rewritten {
    let mut report = RewriteReport::default();
    let mut lines = Vec::with_capacity(manifest.len());
    let mut changed = false;

    for (idx, (raw, parsed)) in manifest.lines().iter().zip(manifest.parsed()).enumerate() {
        let ParsedLine::Requirement(req) = parsed else {
            lines.push(raw.clone());
            continue;
        };

        let Some(version) = snapshot.version(req.name) else {
            debug!("{} is not installed, leaving line {} as is", req.name, idx + 1);
            report.unresolved.push(req.name.to_owned());
            lines.push(raw.clone());
            continue;
        };

        let pinned = format!("{}=={}{}", req.name, version, req.trailing);
        debug!("line {}: {} -> =={version}", idx + 1, req.name);
        changed |= pinned != *raw;
        report.pinned.push(PinnedEntry {
            line: idx + 1,
            name: req.name.to_owned(),
            previous: req.constraint(),
            version: version.to_owned(),
        });
        lines.push(pinned);
    }

    Rewritten {
        manifest: Manifest::from_lines(lines),
        report,
        changed,
    }
}
