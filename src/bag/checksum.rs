//! Parallel file digesting
//!
//! A fixed pool of hasher threads pulls jobs from a crossbeam channel and
//! streams each file through the digest in 64 KiB chunks. Hashing is the
//! only parallel boundary in a bag check; results are collected and
//! ordered by the caller.

use crate::bag::manifest::Algorithm;
use crossbeam_channel::unbounded;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::trace;

const READ_BUF_SIZE: usize = 64 * 1024;

/// One file to digest and compare against its manifested value
#[derive(Debug, Clone)]
pub struct HashJob {
    /// Path relative to the bag root, as the manifest names it
    pub rel: PathBuf,

    /// Absolute path on disk
    pub abs: PathBuf,

    /// Algorithm of the manifest the expectation came from
    pub algorithm: Algorithm,

    /// Expected lowercase hex digest
    pub expected: String,
}

/// Comparison result for one job
#[derive(Debug)]
pub enum HashOutcome {
    /// Digest matches the manifest
    Match,

    /// Digest differs from the manifest
    Mismatch { found: String },

    /// The file could not be read
    Failed { reason: String },
}

#[derive(Debug)]
pub struct HashResult {
    pub job: HashJob,
    pub outcome: HashOutcome,
}

/// Digest a single file with the given algorithm, returning lowercase hex
pub fn digest_file(path: &Path, algorithm: Algorithm) -> io::Result<String> {
    let mut file = File::open(path)?;
    match algorithm {
        Algorithm::Sha256 => digest_reader::<Sha256>(&mut file),
        Algorithm::Sha512 => digest_reader::<Sha512>(&mut file),
    }
}

fn digest_reader<D: Digest>(reader: &mut impl Read) -> io::Result<String> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Run `jobs` across a pool of `workers` hasher threads.
///
/// Results arrive in completion order; every job produces exactly one
/// result. A pool is spawned per call - bag checks are independent and
/// share no hashing state.
pub fn run_pool(jobs: Vec<HashJob>, workers: usize) -> Vec<HashResult> {
    if jobs.is_empty() {
        return Vec::new();
    }

    let worker_count = workers.max(1).min(jobs.len());
    let (job_tx, job_rx) = unbounded::<HashJob>();
    let (result_tx, result_rx) = unbounded::<HashResult>();

    for job in jobs {
        // The receiver is alive until the workers drain the queue.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let mut handles = Vec::with_capacity(worker_count);
    for id in 0..worker_count {
        let job_rx = job_rx.clone();
        let result_tx = result_tx.clone();

        let handle = thread::Builder::new()
            .name(format!("hasher-{}", id))
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let outcome = match digest_file(&job.abs, job.algorithm) {
                        Ok(found) if found.eq_ignore_ascii_case(&job.expected) => {
                            HashOutcome::Match
                        }
                        Ok(found) => HashOutcome::Mismatch { found },
                        Err(e) => HashOutcome::Failed {
                            reason: e.to_string(),
                        },
                    };
                    trace!(hasher = id, path = %job.rel.display(), "File digested");
                    if result_tx.send(HashResult { job, outcome }).is_err() {
                        break;
                    }
                }
            })
            .expect("Failed to spawn hasher thread");

        handles.push(handle);
    }
    drop(result_tx);

    let results: Vec<HashResult> = result_rx.iter().collect();
    for handle in handles {
        let _ = handle.join();
    }

    results
}
