use crate::requirement::{parse_line, ParsedLine, Requirement};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MANIFEST: &str = "requirements.txt";
/// Manifest argument meaning "do not read any manifest".
pub const NO_MANIFEST_SENTINEL: &str = ".";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest is not valid {encoding}")]
    Encoding { encoding: &'static str },
    #[error("failed to write manifest {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the manifest comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    File(PathBuf),
    /// The user asked to run without a manifest.
    Absent,
}

impl ManifestSource {
    /// Resolve a command-line argument: `None` selects `requirements.txt`,
    /// the `.` sentinel selects no manifest.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::File(PathBuf::from(DEFAULT_MANIFEST)),
            Some(NO_MANIFEST_SENTINEL) => Self::Absent,
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Absent => None,
        }
    }

    pub fn load(&self) -> Result<Manifest, ManifestError> {
        match self {
            Self::File(path) => read_manifest(path),
            Self::Absent => Ok(Manifest::default()),
        }
    }
}

/// A requirements manifest as an ordered list of raw lines.
///
/// Each line keeps its terminator, so concatenating the lines reproduces the
/// decoded file text exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    lines: Vec<String>,
}

impl Manifest {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_owned).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn parsed(&self) -> impl Iterator<Item = ParsedLine<'_>> {
        self.lines.iter().map(|line| parse_line(line))
    }

    pub fn requirements(&self) -> impl Iterator<Item = Requirement<'_>> {
        self.parsed().filter_map(|parsed| match parsed {
            ParsedLine::Requirement(req) => Some(req),
            ParsedLine::PassThrough(_) => None,
        })
    }

    /// Package names of all requirement lines, in manifest order.
    pub fn package_names(&self) -> Vec<&str> {
        self.requirements().map(|req| req.name).collect()
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }
}

/// Decode raw manifest bytes.
///
/// UTF-8 is assumed unless the first line contains a NUL byte, which is what
/// UTF-16 text looks like when read as an 8-bit encoding; in that case the
/// whole buffer is decoded as UTF-16 (BOM-directed, little-endian otherwise).
pub fn decode_manifest_bytes(bytes: &[u8]) -> Result<String, ManifestError> {
    let first_line_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |i| i + 1);

    if bytes[..first_line_end].contains(&0) {
        debug!("NUL byte in first manifest line, decoding as UTF-16");
        return decode_utf16(bytes);
    }

    String::from_utf8(bytes.to_vec()).map_err(|_| ManifestError::Encoding { encoding: "UTF-8" })
}

fn decode_utf16(bytes: &[u8]) -> Result<String, ManifestError> {
    let err = ManifestError::Encoding { encoding: "UTF-16" };
    let (body, big_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };
    if body.len() % 2 != 0 {
        return Err(err);
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|_| err)
}

pub fn read_manifest(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ManifestError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ManifestError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let text = decode_manifest_bytes(&bytes)?;
    let manifest = Manifest::parse(&text);
    debug!("read {} lines from {}", manifest.len(), path.display());
    Ok(manifest)
}

/// Write `content` to `dest` through a temporary file next to it, so readers
/// never observe a half-written manifest.
///
/// An existing `dest` is rewritten in place: symlinks are followed to the
/// file they name, and that file keeps its permissions.
pub fn write_manifest_atomic(dest: &Path, content: &str) -> Result<(), ManifestError> {
    let write_err = |source: std::io::Error| ManifestError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let target = match fs::canonicalize(dest) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == ErrorKind::NotFound => dest.to_path_buf(),
        Err(e) => return Err(write_err(e)),
    };
    let permissions = match fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(write_err(e)),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;
    if target != dest {
        debug!("rewrote {} through {}", target.display(), dest.display());
    }
    Ok(())
}
