//! Declaration, manifest, and bag-info parsing
//!
//! Tag files are line-oriented: the declaration and bag-info carry
//! `Key: Value` pairs, manifests carry `<hex digest><whitespace><path>`
//! entries. Parsing is strict for structure the engine depends on
//! (declaration keys, digest syntax, payload-relative paths) and lenient
//! for metadata it merely cross-checks (Payload-Oxum).

use crate::bag::{BAG_INFO_NAME, DECLARATION_NAME, PAYLOAD_DIR};
use crate::error::BagError;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Checksum algorithms recognized in manifest file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = BagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            other => Err(BagError::UnsupportedAlgorithm {
                algorithm: other.to_string(),
            }),
        }
    }
}

/// Whether a manifest covers the payload or the tag files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Payload,
    Tag,
}

/// One parsed manifest file: relative path to expected hex digest
#[derive(Debug, Clone)]
pub struct Manifest {
    pub algorithm: Algorithm,
    pub kind: ManifestKind,
    pub entries: BTreeMap<PathBuf, String>,
}

impl Manifest {
    /// Parse `<bag_root>/<file_name>`.
    ///
    /// Digests are normalized to lowercase. Entries must stay inside the
    /// bag; payload entries must point into the payload directory.
    pub fn load(
        bag_root: &Path,
        file_name: &str,
        algorithm: Algorithm,
        kind: ManifestKind,
    ) -> Result<Self, BagError> {
        let file = bag_root.join(file_name);
        let text = fs::read_to_string(&file).map_err(|e| BagError::Io {
            path: file.clone(),
            source: e,
        })?;

        let mut entries = BTreeMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let (digest, rest) =
                line.split_once(char::is_whitespace)
                    .ok_or_else(|| BagError::ManifestLine {
                        file: file.clone(),
                        line: idx + 1,
                        reason: "expected '<digest> <path>'".to_string(),
                    })?;

            // md5sum-style output marks binary mode with a leading '*'.
            let rel = rest.trim_start().trim_start_matches('*');

            if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(BagError::ManifestLine {
                    file: file.clone(),
                    line: idx + 1,
                    reason: format!("digest '{digest}' is not hexadecimal"),
                });
            }
            if rel.is_empty() {
                return Err(BagError::ManifestLine {
                    file: file.clone(),
                    line: idx + 1,
                    reason: "empty path".to_string(),
                });
            }

            let rel_path = PathBuf::from(rel);
            let escapes = rel_path.is_absolute()
                || rel_path
                    .components()
                    .any(|c| matches!(c, Component::ParentDir));
            let outside_payload =
                kind == ManifestKind::Payload && !rel_path.starts_with(PAYLOAD_DIR);
            if escapes || outside_payload {
                return Err(BagError::UnsafePath {
                    file: file.clone(),
                    entry: rel.to_string(),
                });
            }

            entries.insert(rel_path, digest.to_ascii_lowercase());
        }

        Ok(Self {
            algorithm,
            kind,
            entries,
        })
    }
}

/// The bagit.txt declaration
#[derive(Debug, Clone)]
pub struct Declaration {
    pub version: String,
    pub encoding: String,
}

impl Declaration {
    /// Load and parse `<bag_root>/bagit.txt`.
    pub fn load(bag_root: &Path) -> Result<Self, BagError> {
        let path = bag_root.join(DECLARATION_NAME);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BagError::MissingDeclaration {
                    path: bag_root.to_path_buf(),
                })
            }
            Err(e) => return Err(BagError::Io { path, source: e }),
        };

        let version = tag_value(&text, "BagIt-Version").ok_or_else(|| {
            BagError::InvalidDeclaration {
                path: bag_root.to_path_buf(),
                reason: "missing BagIt-Version".to_string(),
            }
        })?;
        let encoding = tag_value(&text, "Tag-File-Character-Encoding").ok_or_else(|| {
            BagError::InvalidDeclaration {
                path: bag_root.to_path_buf(),
                reason: "missing Tag-File-Character-Encoding".to_string(),
            }
        })?;

        Ok(Self {
            version: version.to_string(),
            encoding: encoding.to_string(),
        })
    }
}

/// Payload-Oxum metadata: `<octet count>.<stream count>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadOxum {
    pub bytes: u64,
    pub count: u64,
}

impl fmt::Display for PayloadOxum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.bytes, self.count)
    }
}

impl FromStr for PayloadOxum {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bytes, count) = s.split_once('.').ok_or(())?;
        Ok(Self {
            bytes: bytes.parse().map_err(|_| ())?,
            count: count.parse().map_err(|_| ())?,
        })
    }
}

/// Read Payload-Oxum from bag-info.txt, when both exist.
///
/// A malformed value is reported to the diagnostic channel and ignored;
/// the oxum is a cross-check, not part of the bag's required structure.
pub fn load_payload_oxum(bag_root: &Path) -> Result<Option<PayloadOxum>, BagError> {
    let path = bag_root.join(BAG_INFO_NAME);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BagError::Io { path, source: e }),
    };

    match tag_value(&text, "Payload-Oxum") {
        Some(value) => match value.parse::<PayloadOxum>() {
            Ok(oxum) => Ok(Some(oxum)),
            Err(()) => {
                warn!(path = %path.display(), value, "Malformed Payload-Oxum, ignoring");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Find the value of a `Key: Value` line in a tag file
fn tag_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(key) {
            if let Some(value) = rest.strip_prefix(':') {
                return Some(value.trim());
            }
        }
    }
    None
}
