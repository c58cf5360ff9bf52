//! Requirements manifest parsing, name normalization, and version pinning for pru.
//!
//! This crate is the pure layer of pru: reading a `requirements.txt`-style
//! manifest (`Manifest`, with UTF-16 fallback), classifying each line
//! (`parse_line` → `ParsedLine`), canonicalizing package names for lookup
//! (`NormalizedName`), the installed-package `Snapshot`, and the line-preserving
//! rewrite that pins matched requirements to installed versions (`pin_versions`).

pub mod installed;
pub mod manifest;
pub mod normalize;
pub mod requirement;
pub mod rewrite;

pub use installed::{InstalledPackage, Snapshot};
pub use manifest::{
    decode_manifest_bytes, read_manifest, write_manifest_atomic, Manifest, ManifestError,
    ManifestSource, DEFAULT_MANIFEST, NO_MANIFEST_SENTINEL,
};
pub use normalize::{normalize_name, NormalizedName};
pub use requirement::{parse_line, ParsedLine, Requirement};
pub use rewrite::{pin_versions, PinnedEntry, RewriteReport, Rewritten};
