//! Integration tests for bagsweep
//!
//! These build real bags in temporary directories and exercise discovery
//! and validation end to end through the library surface.

use bagsweep::finder::{BagLocator, NameConvention};
use bagsweep::report::ReportSink;
use bagsweep::validate::{BagValidator, BulkRunner, ValidationOutcome};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Write a complete bag: declaration, payload, sha256 manifest, and
/// a Payload-Oxum in bag-info.txt.
fn write_bag(root: &Path, files: &[(&str, &[u8])]) {
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(
        root.join("bagit.txt"),
        "BagIt-Version: 1.0\nTag-File-Character-Encoding: UTF-8\n",
    )
    .unwrap();

    let mut manifest = String::new();
    let mut byte_total = 0u64;
    for (rel, content) in files {
        let path = root.join("data").join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        manifest.push_str(&format!(
            "{}  data/{}\n",
            hex::encode(Sha256::digest(content)),
            rel
        ));
        byte_total += content.len() as u64;
    }
    fs::write(root.join("manifest-sha256.txt"), manifest).unwrap();
    fs::write(
        root.join("bag-info.txt"),
        format!("Payload-Oxum: {}.{}\n", byte_total, files.len()),
    )
    .unwrap();
}

#[test]
fn test_valid_bag_has_empty_outcome_list() {
    let work = tempdir().unwrap();
    let bag_root = work.path().join("bag_0001");
    write_bag(
        &bag_root,
        &[("a.txt", b"alpha"), ("sub/b.txt", b"bravo")],
    );

    let sink = ReportSink::open(work.path()).unwrap();
    let report = BagValidator::new(&sink, 4).validate(&bag_root);

    assert!(report.is_valid());
    assert!(report.outcomes.is_empty());
    assert_eq!(report.payload_files, 2);
    assert_eq!(report.payload_bytes, 10);
}

#[test]
fn test_corrupted_file_reports_checksum_mismatch() {
    let work = tempdir().unwrap();
    let bag_root = work.path().join("bag_0001");
    write_bag(&bag_root, &[("a.txt", b"alpha"), ("b.txt", b"bravo")]);

    // Same length, different content: only the digest check can notice.
    fs::write(bag_root.join("data/a.txt"), b"alphA").unwrap();

    let sink = ReportSink::open(work.path()).unwrap();
    let report = BagValidator::new(&sink, 4).validate(&bag_root);

    assert!(!report.is_valid());
    let mismatches: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| match o {
            ValidationOutcome::ChecksumMismatch {
                path,
                expected,
                found,
                ..
            } => Some((path, expected, found)),
            _ => None,
        })
        .collect();
    assert_eq!(mismatches.len(), 1);

    let (path, expected, found) = &mismatches[0];
    assert_eq!(*path, &PathBuf::from("data/a.txt"));
    assert_ne!(expected, found);
}

#[test]
fn test_missing_file_reported_exactly_once() {
    let work = tempdir().unwrap();
    let bag_root = work.path().join("bag_0001");
    write_bag(&bag_root, &[("a.txt", b"alpha"), ("b.txt", b"bravo")]);
    fs::remove_file(bag_root.join("data/b.txt")).unwrap();

    let sink = ReportSink::open(work.path()).unwrap();
    let report = BagValidator::new(&sink, 4).validate(&bag_root);

    assert!(!report.is_valid());
    let missing: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| {
            matches!(
                o,
                ValidationOutcome::MissingFile { path } if path == &PathBuf::from("data/b.txt")
            )
        })
        .collect();
    assert_eq!(missing.len(), 1);
}

#[test]
fn test_unexpected_file_reported() {
    let work = tempdir().unwrap();
    let bag_root = work.path().join("bag_0001");
    write_bag(&bag_root, &[("a.txt", b"alpha")]);
    fs::write(bag_root.join("data/extra.txt"), b"stray").unwrap();

    let sink = ReportSink::open(work.path()).unwrap();
    let report = BagValidator::new(&sink, 4).validate(&bag_root);

    assert!(!report.is_valid());
    assert!(report.outcomes.iter().any(|o| matches!(
        o,
        ValidationOutcome::UnexpectedFile { path } if path == &PathBuf::from("data/extra.txt")
    )));
}

#[test]
fn test_directory_without_declaration_is_structural() {
    let work = tempdir().unwrap();
    let not_a_bag = work.path().join("plain_dir");
    fs::create_dir_all(&not_a_bag).unwrap();

    let sink = ReportSink::open(work.path()).unwrap();
    let report = BagValidator::new(&sink, 4).validate(&not_a_bag);

    assert!(!report.is_valid());
    assert_eq!(report.outcomes.len(), 1);
    assert!(matches!(
        report.outcomes[0],
        ValidationOutcome::StructuralError { .. }
    ));
}

#[test]
fn test_nonexistent_path_is_system_error() {
    let work = tempdir().unwrap();

    let sink = ReportSink::open(work.path()).unwrap();
    let report = BagValidator::new(&sink, 4).validate(&work.path().join("no_such_bag"));

    assert!(!report.is_valid());
    assert!(matches!(
        report.outcomes[0],
        ValidationOutcome::SystemError { .. }
    ));
}

#[test]
fn test_discovery_skips_hidden_and_prunes_found_bags() {
    let work = tempdir().unwrap();
    let tree = work.path().join("tree");

    write_bag(&tree.join("bagA"), &[("a.txt", b"alpha")]);
    write_bag(&tree.join(".hidden/bagB"), &[("b.txt", b"bravo")]);
    write_bag(&tree.join("sub/bagC"), &[("c.txt", b"charlie")]);
    // A bag nested inside bagA's payload must not be discovered.
    write_bag(&tree.join("bagA/data/inner"), &[("d.txt", b"delta")]);

    let log_dir = tempdir().unwrap();
    let sink = ReportSink::open(log_dir.path()).unwrap();
    let found = BagLocator::new(&NameConvention, &sink).find(&tree);

    let expected: Vec<PathBuf> = [tree.join("bagA"), tree.join("sub/bagC")]
        .iter()
        .map(|p| fs::canonicalize(p).unwrap())
        .collect();
    assert_eq!(found, expected);

    // Pruning invariant: no result is a strict descendant of another.
    for a in &found {
        for b in &found {
            if a != b {
                assert!(!a.starts_with(b), "{:?} descends from {:?}", a, b);
            }
        }
    }
}

#[test]
fn test_discovery_of_empty_tree_is_empty_not_error() {
    let work = tempdir().unwrap();
    let tree = work.path().join("tree");
    fs::create_dir_all(tree.join("just/plain/dirs")).unwrap();

    let log_dir = tempdir().unwrap();
    let sink = ReportSink::open(log_dir.path()).unwrap();
    let locator = BagLocator::new(&NameConvention, &sink);

    assert!(locator.find(&tree).is_empty());
    assert!(locator.find(&work.path().join("missing_root")).is_empty());
}

#[test]
fn test_marker_below_top_level_is_not_a_bag() {
    let work = tempdir().unwrap();
    let tree = work.path().join("tree");

    // bagit.txt buried in a subdirectory does not mark `stash` as a bag,
    // but the directory holding it directly is one.
    fs::create_dir_all(tree.join("stash/deep")).unwrap();
    fs::write(tree.join("stash/deep/bagit.txt"), "BagIt-Version: 1.0\n").unwrap();

    let log_dir = tempdir().unwrap();
    let sink = ReportSink::open(log_dir.path()).unwrap();
    let found = BagLocator::new(&NameConvention, &sink).find(&tree);

    assert_eq!(
        found,
        vec![fs::canonicalize(tree.join("stash/deep")).unwrap()]
    );
}

#[test]
fn test_bulk_report_preserves_input_order() {
    let work = tempdir().unwrap();
    let p1 = work.path().join("bag_c");
    let p2 = work.path().join("bag_a");
    let p3 = work.path().join("bag_b");
    write_bag(&p1, &[("a.txt", b"alpha")]);
    write_bag(&p2, &[("b.txt", b"bravo")]);
    write_bag(&p3, &[("c.txt", b"charlie")]);
    // Make the middle bag invalid; it must not disturb the others.
    fs::remove_file(p2.join("data/b.txt")).unwrap();

    let sink = ReportSink::open(work.path()).unwrap();
    let validator = BagValidator::new(&sink, 4);
    let paths = vec![p1.clone(), p2.clone(), p3.clone()];
    let report = BulkRunner::new(validator).run(&paths);

    let reported: Vec<&PathBuf> = report.bags.iter().map(|b| &b.path).collect();
    assert_eq!(reported, vec![&p1, &p2, &p3]);
    assert_eq!(report.valid_count(), 2);
    assert_eq!(report.invalid_count(), 1);
    assert!(report.bags[0].is_valid());
    assert!(!report.bags[1].is_valid());
    assert!(report.bags[2].is_valid());
}

#[test]
fn test_validation_is_idempotent() {
    let work = tempdir().unwrap();
    let bag_root = work.path().join("bag_0001");
    write_bag(&bag_root, &[("a.txt", b"alpha"), ("b.txt", b"bravo")]);
    fs::write(bag_root.join("data/a.txt"), b"alphA").unwrap();
    fs::remove_file(bag_root.join("data/b.txt")).unwrap();

    let sink = ReportSink::open(work.path()).unwrap();
    let validator = BagValidator::new(&sink, 4);

    let first = validator.validate(&bag_root);
    let second = validator.validate(&bag_root);
    assert_eq!(first.outcomes, second.outcomes);
}

#[test]
fn test_report_log_lines() {
    let work = tempdir().unwrap();
    let bag_root = work.path().join("bag_0001");
    write_bag(&bag_root, &[("a.txt", b"alpha")]);
    fs::write(bag_root.join("data/a.txt"), b"alphA").unwrap();

    let log_dir = tempdir().unwrap();
    let sink = ReportSink::open(log_dir.path()).unwrap();
    BagValidator::new(&sink, 4).validate(&bag_root);
    sink.finish().unwrap();

    let log = fs::read_to_string(sink.path()).unwrap();
    assert!(log.contains(&format!("VALIDATING: \t{}", bag_root.display())));
    assert!(log.contains("Expected data/a.txt to have sha256 checksum of "));
    assert!(log.contains(&format!("Bag validation failed: {}", bag_root.display())));
    assert!(log.contains(&format!("INVALID: \t{}", bag_root.display())));

    // Every line is leveled and timestamped.
    for line in log.lines() {
        assert!(
            line.starts_with("INFO: ") || line.starts_with("ERROR: "),
            "unexpected line: {line}"
        );
    }
}

#[test]
fn test_valid_bag_log_lines() {
    let work = tempdir().unwrap();
    let bag_root = work.path().join("bag_0001");
    write_bag(&bag_root, &[("a.txt", b"alpha")]);

    let log_dir = tempdir().unwrap();
    let sink = ReportSink::open(log_dir.path()).unwrap();
    BagValidator::new(&sink, 4).validate(&bag_root);
    sink.finish().unwrap();

    let log = fs::read_to_string(sink.path()).unwrap();
    assert!(log.contains(&format!("VALID: \t{}", bag_root.display())));
    assert!(!log.contains("INVALID:"));
    assert!(!log.contains("ERROR:"));
}
