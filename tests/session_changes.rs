//! Integration tests for change tracking and write-back.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use gorg::{GorgError, Session};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/write_files")
        .join(path)
}

fn base_name(id: &str) -> String {
    Path::new(id)
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string()
}

#[test]
fn test_write_files() {
    let out_dir = TempDir::new().expect("Failed to create temp dir");

    let mut session = Session::new();
    session.add_dir(&fixture("input")).unwrap();
    session.organize_all().unwrap();

    session
        .write_files(|id, content| fs::write(out_dir.path().join(base_name(id)), content))
        .unwrap();

    let changed: Vec<String> = session.changed_files().into_iter().map(base_name).collect();
    assert_eq!(changed, vec!["foo.go".to_string()]);

    let want = fs::read_to_string(fixture("want/foo.go")).unwrap();
    let got = fs::read_to_string(out_dir.path().join("foo.go")).unwrap();
    assert_eq!(got, want);
    assert!(!out_dir.path().join("foo_test.go").exists());
}

#[test]
fn test_write_files_reports_sink_error() {
    let mut session = Session::new();
    session.add_dir(&fixture("input")).unwrap();
    session.organize_all().unwrap();

    let missing = TempDir::new().unwrap().path().join("gone");
    let err = session
        .write_files(|id, content| fs::write(missing.join(base_name(id)), content))
        .unwrap_err();
    assert!(matches!(err, GorgError::Write { .. }));
}

#[test]
fn test_organize_twice_keeps_single_change() {
    let source = "package p\n\nfunc b() {}\n\nfunc a() {}\n";
    let mut session = Session::new();
    session.add("p.go", source).unwrap();

    session.organize("p.go").unwrap();
    session.organize("p.go").unwrap();

    assert_eq!(session.changes().len(), 1);
    let change = session.change("p.go").unwrap();
    assert_eq!(change.original, source.as_bytes());
    assert_eq!(change.current, b"package p\n\nfunc a() {}\n\nfunc b() {}\n");
}

#[test]
fn test_separate_then_organize_tracks_latest_content() {
    let source = "package p\n\nvar (\n\ta int = 1\n\tb string = \"\"\n)\n\nfunc z() {}\n";
    let mut session = Session::new();
    session.add("p.go", source).unwrap();

    let split = session.separate_values("p.go").unwrap();
    let organized = session.organize("p.go").unwrap();

    assert_eq!(split, organized);
    assert_eq!(session.change("p.go").unwrap().current, organized);
    assert_eq!(session.current("p.go").unwrap(), organized.as_slice());
}

#[test]
fn test_already_organized_package_has_no_changes() {
    let mut session = Session::new();
    session
        .add_files(vec![
            ("a.go", b"package p\n\nfunc a() {}\n".to_vec()),
            ("b.go", b"package p\n\ntype B struct{}\n\nfunc (b B) M() {}\n".to_vec()),
        ])
        .unwrap();
    session.organize_all().unwrap();

    assert!(session.changed_files().is_empty());

    let mut calls = 0;
    session
        .write_files(|_, _| {
            calls += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(calls, 0);
}
