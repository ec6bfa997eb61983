#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn run(events: &Path, db_path: &Path) -> Output {
    Command::new(cargo_bin!("pos-multicurrency"))
        .arg("process")
        .arg(events)
        .arg("--settings")
        .arg("tests/fixtures/settings.json")
        .arg("--db-path")
        .arg(db_path)
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: commit a cash order and stage MXN data for an order still open
    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv1, "type, order, method, currency, amount, rate, line, reference").unwrap();
    writeln!(csv1, "pay, uuid-0, 1, , 10, , , ").unwrap();
    writeln!(csv1, "commit, uuid-0, , , , , , Order 0001").unwrap();
    writeln!(csv1, "stage, uuid-1, 2, 2, 100, 0.054, , ").unwrap();

    let output1 = run(csv1.path(), &db_path);
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("1,1,1,10,,,1"));

    // 2. Second run: the open order is paid and committed using the same DB path
    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv2, "type, order, method, currency, amount, rate, line, reference").unwrap();
    writeln!(csv2, "pay, uuid-1, 2, , 5.40, , , ").unwrap();
    writeln!(csv2, "commit, uuid-1, , , , , , Order 0002").unwrap();

    let output2 = run(csv2.path(), &db_path);
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    // Ids continue after the recovered rows, and the staged data survived the restart
    assert!(stdout2.contains("1,1,1,10,,,1"));
    assert!(stdout2.contains("2,2,2,5.4,2,100,0.054"));
}
