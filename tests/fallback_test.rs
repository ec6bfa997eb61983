use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn events() -> tempfile::NamedTempFile {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "type, order, method, currency, amount, rate, line, reference").unwrap();
    writeln!(csv, "pay, uuid-1, 1, , 100.0, , , ").unwrap();
    writeln!(csv, "commit, uuid-1, , , , , , ").unwrap();
    csv
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let csv = events();

    let mut cmd = Command::new(cargo_bin!("pos-multicurrency"));
    cmd.env_remove("RUST_LOG")
        .arg("process")
        .arg(csv.path())
        .arg("--settings")
        .arg("tests/fixtures/settings.json")
        .arg("--db-path")
        .arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."))
        .stdout(predicate::str::contains("1,1,1,100,,,1"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let csv = events();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("pos-multicurrency"));
    cmd.env_remove("RUST_LOG")
        .arg("process")
        .arg(csv.path())
        .arg("--settings")
        .arg("tests/fixtures/settings.json")
        .arg("--db-path")
        .arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
