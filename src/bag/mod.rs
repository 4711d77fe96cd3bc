//! Bag structure parsing and verification
//!
//! A bag is a directory declared by a top-level `bagit.txt`, carrying one
//! or more payload manifests (`manifest-<algorithm>.txt`) that list the
//! expected files under `data/` with their checksums, optional tag
//! manifests (`tagmanifest-<algorithm>.txt`) covering the tag files, and
//! optional `bag-info.txt` metadata.
//!
//! [`Bag::open`] parses the static structure and fails on a bag the
//! engine cannot reason about at all. [`Bag::verify`] never fails: every
//! per-file problem - a digest mismatch, a manifested file absent from
//! disk, an unmanifested extra, an unreadable path - becomes a
//! [`Discrepancy`], and a single verification enumerates all of them
//! rather than stopping at the first.

pub mod checksum;
pub mod manifest;

pub use manifest::{Algorithm, Declaration, Manifest, ManifestKind, PayloadOxum};

use crate::error::BagError;
use checksum::{HashJob, HashOutcome};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Marker file identifying a directory as a bag
pub const DECLARATION_NAME: &str = "bagit.txt";

/// Payload directory name
pub const PAYLOAD_DIR: &str = "data";

const BAG_INFO_NAME: &str = "bag-info.txt";

/// One deviation between the manifests and on-disk reality
///
/// Paths are relative to the bag root, as the manifests name them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Discrepancy {
    /// A file's digest differs from its manifested value
    Digest {
        path: PathBuf,
        algorithm: Algorithm,
        expected: String,
        found: String,
    },

    /// A manifested file is absent on disk
    Missing { path: PathBuf },

    /// An on-disk payload file appears in no payload manifest
    Unexpected { path: PathBuf },

    /// A path could not be read during verification
    Unreadable { path: PathBuf, reason: String },

    /// Payload-Oxum does not match the on-disk payload
    Oxum { expected: String, found: String },
}

/// The result of verifying one bag
#[derive(Debug, Default)]
pub struct Verification {
    /// Sorted, deduplicated discrepancy list; empty means valid
    pub discrepancies: Vec<Discrepancy>,

    /// On-disk payload file count
    pub payload_files: u64,

    /// On-disk payload byte total
    pub payload_bytes: u64,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// A parsed bag, ready to verify
#[derive(Debug)]
pub struct Bag {
    root: PathBuf,
    declaration: Declaration,
    payload_manifests: Vec<Manifest>,
    tag_manifests: Vec<Manifest>,
    oxum: Option<PayloadOxum>,
}

impl Bag {
    /// Parse the bag's static structure.
    ///
    /// Fails for a path that is not a directory, a missing or invalid
    /// declaration, an absent payload manifest, or an unparseable
    /// manifest. Per-file payload problems are deferred to [`verify`].
    ///
    /// [`verify`]: Bag::verify
    pub fn open(root: &Path) -> Result<Self, BagError> {
        let meta = fs::metadata(root).map_err(|e| BagError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !meta.is_dir() {
            return Err(BagError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let declaration = Declaration::load(root)?;

        let mut payload_manifests = Vec::new();
        let mut tag_manifests = Vec::new();
        let entries = fs::read_dir(root).map_err(|e| BagError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| BagError::Io {
                path: root.to_path_buf(),
                source: e,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some((algorithm, kind)) = classify_manifest_name(&name)? {
                let manifest = Manifest::load(root, &name, algorithm, kind)?;
                match kind {
                    ManifestKind::Payload => payload_manifests.push(manifest),
                    ManifestKind::Tag => tag_manifests.push(manifest),
                }
            }
        }

        if payload_manifests.is_empty() {
            return Err(BagError::NoManifest {
                path: root.to_path_buf(),
            });
        }

        let oxum = manifest::load_payload_oxum(root)?;

        debug!(
            path = %root.display(),
            version = %declaration.version,
            payload_manifests = payload_manifests.len(),
            tag_manifests = tag_manifests.len(),
            "Opened bag"
        );

        Ok(Self {
            root: root.to_path_buf(),
            declaration,
            payload_manifests,
            tag_manifests,
            oxum,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    /// Check the bag's contents against its manifests with `processes`
    /// hasher threads.
    ///
    /// Never fails; every problem is a returned discrepancy. The list is
    /// sorted and deduplicated, so verifying an unmodified bag twice
    /// yields equal lists.
    pub fn verify(&self, processes: usize) -> Verification {
        let mut verification = Verification::default();

        let payload = self.payload_inventory(&mut verification.discrepancies);
        verification.payload_files = payload.len() as u64;
        verification.payload_bytes = payload.values().sum();

        // Completeness: manifested-but-absent, then present-but-unmanifested.
        // The expected set spans all payload manifests so a file missing
        // from disk is reported once however many manifests name it.
        let expected: BTreeSet<&PathBuf> = self
            .payload_manifests
            .iter()
            .flat_map(|m| m.entries.keys())
            .collect();
        for rel in &expected {
            if !payload.contains_key(*rel) {
                verification.discrepancies.push(Discrepancy::Missing {
                    path: (*rel).clone(),
                });
            }
        }
        for rel in payload.keys() {
            if !expected.contains(rel) {
                verification
                    .discrepancies
                    .push(Discrepancy::Unexpected { path: rel.clone() });
            }
        }

        // Digest every manifested file that exists on disk. Tag files are
        // covered by tag manifests when present; a missing tag file is a
        // Missing discrepancy but tag files are never Unexpected.
        let mut jobs = Vec::new();
        for m in &self.payload_manifests {
            for (rel, expected_digest) in &m.entries {
                if payload.contains_key(rel) {
                    jobs.push(HashJob {
                        rel: rel.clone(),
                        abs: self.root.join(rel),
                        algorithm: m.algorithm,
                        expected: expected_digest.clone(),
                    });
                }
            }
        }
        for m in &self.tag_manifests {
            for (rel, expected_digest) in &m.entries {
                let abs = self.root.join(rel);
                if abs.is_file() {
                    jobs.push(HashJob {
                        rel: rel.clone(),
                        abs,
                        algorithm: m.algorithm,
                        expected: expected_digest.clone(),
                    });
                } else {
                    verification
                        .discrepancies
                        .push(Discrepancy::Missing { path: rel.clone() });
                }
            }
        }

        for result in checksum::run_pool(jobs, processes) {
            match result.outcome {
                HashOutcome::Match => {}
                HashOutcome::Mismatch { found } => {
                    verification.discrepancies.push(Discrepancy::Digest {
                        path: result.job.rel,
                        algorithm: result.job.algorithm,
                        expected: result.job.expected,
                        found,
                    });
                }
                HashOutcome::Failed { reason } => {
                    verification.discrepancies.push(Discrepancy::Unreadable {
                        path: result.job.rel,
                        reason,
                    });
                }
            }
        }

        if let Some(oxum) = &self.oxum {
            if oxum.bytes != verification.payload_bytes
                || oxum.count != verification.payload_files
            {
                verification.discrepancies.push(Discrepancy::Oxum {
                    expected: oxum.to_string(),
                    found: format!(
                        "{}.{}",
                        verification.payload_bytes, verification.payload_files
                    ),
                });
            }
        }

        verification.discrepancies.sort();
        verification.discrepancies.dedup();
        verification
    }

    /// Walk `data/`, collecting relative path to byte size.
    ///
    /// An unreadable directory becomes a discrepancy, never a walk abort.
    /// A missing `data/` yields an empty inventory; every manifested file
    /// then surfaces as Missing.
    fn payload_inventory(
        &self,
        discrepancies: &mut Vec<Discrepancy>,
    ) -> BTreeMap<PathBuf, u64> {
        let mut inventory = BTreeMap::new();
        let data_root = self.root.join(PAYLOAD_DIR);
        if !data_root.is_dir() {
            return inventory;
        }

        let mut frontier = vec![data_root];
        while let Some(dir) = frontier.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    discrepancies.push(Discrepancy::Unreadable {
                        path: self.rel_of(&dir),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        discrepancies.push(Discrepancy::Unreadable {
                            path: self.rel_of(&dir),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };

                let file_type = match entry.file_type() {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        discrepancies.push(Discrepancy::Unreadable {
                            path: self.rel_of(&entry.path()),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };

                if file_type.is_dir() {
                    frontier.push(entry.path());
                } else if file_type.is_file() {
                    let size = match entry.metadata() {
                        Ok(meta) => meta.len(),
                        Err(e) => {
                            discrepancies.push(Discrepancy::Unreadable {
                                path: self.rel_of(&entry.path()),
                                reason: e.to_string(),
                            });
                            continue;
                        }
                    };
                    inventory.insert(self.rel_of(&entry.path()), size);
                } else {
                    trace!(path = %entry.path().display(), "Ignoring special payload entry");
                }
            }
        }

        inventory
    }

    fn rel_of(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_path_buf()
    }
}

fn classify_manifest_name(
    name: &str,
) -> Result<Option<(Algorithm, ManifestKind)>, BagError> {
    let (kind, rest) = if let Some(rest) = name.strip_prefix("tagmanifest-") {
        (ManifestKind::Tag, rest)
    } else if let Some(rest) = name.strip_prefix("manifest-") {
        (ManifestKind::Payload, rest)
    } else {
        return Ok(None);
    };

    let Some(algorithm) = rest.strip_suffix(".txt") else {
        return Ok(None);
    };

    Ok(Some((algorithm.parse()?, kind)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_manifest_name() {
        assert_eq!(
            classify_manifest_name("manifest-sha256.txt").unwrap(),
            Some((Algorithm::Sha256, ManifestKind::Payload))
        );
        assert_eq!(
            classify_manifest_name("tagmanifest-sha512.txt").unwrap(),
            Some((Algorithm::Sha512, ManifestKind::Tag))
        );
        assert_eq!(classify_manifest_name("bagit.txt").unwrap(), None);
        assert_eq!(classify_manifest_name("manifest-sha256.bak").unwrap(), None);

        assert!(classify_manifest_name("manifest-md5.txt").is_err());
    }

    #[test]
    fn test_discrepancy_ordering_is_stable() {
        let mut list = vec![
            Discrepancy::Unexpected {
                path: "data/z.txt".into(),
            },
            Discrepancy::Missing {
                path: "data/a.txt".into(),
            },
            Discrepancy::Missing {
                path: "data/a.txt".into(),
            },
        ];
        list.sort();
        list.dedup();

        assert_eq!(
            list,
            vec![
                Discrepancy::Missing {
                    path: "data/a.txt".into(),
                },
                Discrepancy::Unexpected {
                    path: "data/z.txt".into(),
                },
            ]
        );
    }
}
