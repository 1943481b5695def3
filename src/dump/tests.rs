use std::fs;
use std::io::Read;

use tempfile::tempdir;

use super::*;

#[test]
fn run_id_renders_seconds_dash_micros() {
    let run = RunId {
        secs: 1_700_000_000,
        micros: 42,
    };
    assert_eq!(run.to_string(), "1700000000-42");
    assert_eq!(RunId::parse("1700000000-42"), Some(run));
    assert_eq!(
        run.started_at().map(|t| t.timestamp()),
        Some(1_700_000_000)
    );
}

#[test]
fn run_id_rejects_foreign_namespaces() {
    assert_eq!(RunId::parse("crash"), None);
    assert_eq!(RunId::parse("12-"), None);
    assert_eq!(RunId::parse("-12"), None);
    assert_eq!(RunId::parse("1-2000000"), None);
    assert_eq!(RunId::parse("+1-2"), None);
}

#[test]
fn record_names_roundtrip_through_parser() {
    assert_eq!(record_file_name("1700000000-5", 3), "1700000000-5.3");
    assert_eq!(
        parse_record_file_name("1700000000-5.3"),
        Some(("1700000000-5", 3))
    );
    assert_eq!(parse_record_file_name("crash.v2.10"), Some(("crash.v2", 10)));
    assert_eq!(parse_record_file_name("noext"), None);
    assert_eq!(parse_record_file_name(".4"), None);
    assert_eq!(parse_record_file_name("run.+4"), None);
    assert_eq!(parse_record_file_name("run.tmp"), None);
}

#[test]
fn record_writes_exact_bytes() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path());
    dump.record("run", 0, b"\x00\x01payload\xff").unwrap();

    let raw = fs::read(dir.path().join("run.0")).unwrap();
    assert_eq!(raw, b"\x00\x01payload\xff");
}

#[test]
fn record_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path());
    dump.record("run", 0, b"a much longer first payload").unwrap();
    dump.record("run", 0, b"short").unwrap();
    assert_eq!(fs::read(dump.record_path("run", 0)).unwrap(), b"short");
}

#[test]
fn record_into_missing_directory_is_a_violation() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path().join("absent"));
    let err = dump.record("run", 0, b"x").unwrap_err();
    assert!(matches!(err, HarnessError::Record { .. }), "{err}");
    assert_eq!(err.path(), dir.path().join("absent").join("run.0"));
}

#[test]
fn open_distinguishes_absent_records() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path());
    dump.record("run", 0, b"zero").unwrap();

    let mut file = dump.open("run", 0).unwrap().expect("record 0 exists");
    let mut raw = Vec::new();
    file.read_to_end(&mut raw).unwrap();
    assert_eq!(raw, b"zero");

    assert!(dump.open("run", 1).unwrap().is_none());
    assert!(dump.open("other", 0).unwrap().is_none());
}

#[test]
fn purge_is_idempotent_and_scoped_to_namespace() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path());
    for sequence in 0..3 {
        dump.record("mine", sequence, b"m").unwrap();
    }
    dump.record("theirs", 0, b"t").unwrap();

    assert_eq!(dump.purge("mine", 3), 3);
    assert_eq!(dump.purge("mine", 3), 0);
    assert!(dir.path().join("theirs.0").exists());
}

#[test]
fn purge_namespace_removes_records_past_gaps() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path());
    for sequence in [0, 1, 5] {
        dump.record("run", sequence, b"r").unwrap();
    }
    assert_eq!(dump.purge_namespace("run", None).unwrap(), 3);
    assert_eq!(dump.purge_namespace("run", None).unwrap(), 0);
    assert!(dump.scan().unwrap().is_empty());
}

#[test]
fn ensure_exists_creates_nested_directory() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path().join("a").join("dump"));
    dump.ensure_exists().unwrap();
    dump.ensure_exists().unwrap();
    assert!(dump.path().is_dir());
}

#[test]
fn ensure_exists_rejects_regular_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump");
    fs::write(&path, b"not a dir").unwrap();
    let err = DumpDir::new(&path).ensure_exists().unwrap_err();
    assert!(matches!(err, HarnessError::DumpDir { .. }), "{err}");
}

#[test]
fn scan_groups_and_sorts_records() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path());
    for sequence in [2, 0, 1, 4] {
        dump.record("1700000000-1", sequence, b"x").unwrap();
    }
    dump.record("crash", 0, b"y").unwrap();
    fs::write(dir.path().join("README"), b"ignored").unwrap();
    fs::create_dir(dir.path().join("nested.0")).unwrap();

    let runs = dump.scan().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].namespace, "1700000000-1");
    assert_eq!(runs[0].sequences, vec![0, 1, 2, 4]);
    assert_eq!(runs[0].contiguous(), 3);
    assert_eq!(runs[0].first_gap(), Some(3));
    assert_eq!(runs[0].last_replayable(), Some(2));
    assert!(runs[0].run_id().is_some());

    assert_eq!(runs[1].namespace, "crash");
    assert_eq!(runs[1].first_gap(), None);
    assert!(runs[1].run_id().is_none());
}

#[test]
fn scan_of_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path().join("never-created"));
    assert!(dump.scan().unwrap().is_empty());
}

#[test]
fn listing_without_record_zero_has_nothing_to_replay() {
    let listing = RunListing {
        namespace: "run".to_string(),
        sequences: vec![1, 2],
    };
    assert_eq!(listing.contiguous(), 0);
    assert_eq!(listing.first_gap(), Some(0));
    assert_eq!(listing.last_replayable(), None);
    assert_eq!(listing.record_count(), 2);
}

#[test]
fn bounded_namespace_purge_visits_only_existing_records() {
    let dir = tempdir().unwrap();
    let dump = DumpDir::new(dir.path());
    for sequence in [0, 1, 7] {
        dump.record("run", sequence, b"r").unwrap();
    }

    assert_eq!(dump.purge_namespace("run", Some(2)).unwrap(), 2);
    assert!(dump.record_path("run", 7).exists());
    assert_eq!(dump.purge_namespace("run", Some(u64::MAX)).unwrap(), 1);
    assert!(dump.scan().unwrap().is_empty());
}
