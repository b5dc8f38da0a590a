use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

const BOOK_JSON: &str = r#"{
  "title": "Winter Orchard",
  "author": "L. Frost",
  "category": "poetry",
  "credits": "Thanks to the orchard.",
  "chapters": [
    {"title": "Snow", "content": "White on white.\n\nThe branches bow.", "order": 2},
    {"title": "Thaw", "content": "Water finds the roots.", "order": 1}
  ]
}"#;

fn book_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("book.json");
    fs::write(&path, BOOK_JSON).unwrap();
    path
}

fn bookpress(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bookpress");
    cmd.current_dir(dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_dry_run_reports_pages() {
    let dir = tempdir().unwrap();
    let book = book_file(&dir);
    bookpress(&dir)
        .arg("-b")
        .arg(&book)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry-run validation complete"))
        .stdout(predicate::str::contains("2 chapter(s)"));
    assert!(!dir.path().join("output.pdf").exists());
}

#[test]
fn test_binary_writes_pdf() {
    let dir = tempdir().unwrap();
    let book = book_file(&dir);
    bookpress(&dir)
        .arg("-b")
        .arg(&book)
        .arg("-o")
        .arg("winter.pdf")
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully saved PDF"))
        .stdout(predicate::str::contains("Size:"));
    let bytes = fs::read(dir.path().join("winter.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_binary_format_from_extension() {
    let dir = tempdir().unwrap();
    let book = book_file(&dir);
    bookpress(&dir)
        .arg("-b")
        .arg(&book)
        .arg("-o")
        .arg("winter.md")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let md = fs::read_to_string(dir.path().join("winter.md")).unwrap();
    assert!(md.starts_with("# Winter Orchard"));
    assert!(md.find("Thaw").unwrap() < md.find("Snow").unwrap());
}

#[test]
fn test_binary_data_uri() {
    let dir = tempdir().unwrap();
    let book = book_file(&dir);
    bookpress(&dir)
        .arg("-b")
        .arg(&book)
        .arg("-f")
        .arg("html")
        .arg("--data-uri")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("data:text/html;base64,"));
    assert!(!dir.path().join("output.html").exists());
}

#[test]
fn test_binary_plan_blocks_format() {
    let dir = tempdir().unwrap();
    let book = book_file(&dir);
    bookpress(&dir)
        .arg("-b")
        .arg(&book)
        .arg("-f")
        .arg("html")
        .arg("--plan")
        .arg("free")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Plan error"));
}

#[test]
fn test_binary_missing_book_file_fails() {
    let dir = tempdir().unwrap();
    bookpress(&dir)
        .arg("-b")
        .arg("nope.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Book error"));
}

#[test]
fn test_binary_returns_failure_when_no_input() {
    let dir = tempdir().unwrap();
    bookpress(&dir).assert().failure();
}

#[test]
fn test_binary_prints_default_configuration() {
    let dir = tempdir().unwrap();
    bookpress(&dir)
        .arg("--get-default-configuration")
        .assert()
        .success()
        .stdout(predicate::str::contains("[page]"))
        .stdout(predicate::str::contains("[features]"));
}

#[test]
fn test_binary_lists_schemes_and_categories() {
    let dir = tempdir().unwrap();
    bookpress(&dir)
        .arg("--list-schemes")
        .assert()
        .success()
        .stdout(predicate::str::contains("vintage"));
    bookpress(&dir)
        .arg("--list-categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("poetry"));
}

#[test]
fn test_binary_reads_local_config() {
    let dir = tempdir().unwrap();
    let book = book_file(&dir);
    fs::write(
        dir.path().join("bookpressrc.toml"),
        "[features]\ncover_page = false\ncredits_page = false\n",
    )
    .unwrap();
    bookpress(&dir)
        .arg("-b")
        .arg(&book)
        .arg("-o")
        .arg("out.txt")
        .assert()
        .success();
    let text = fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert!(!text.contains("by L. Frost"));
    assert!(!text.contains("Credits"));
}

#[test]
fn test_binary_writes_epub_from_extension() {
    let dir = tempdir().unwrap();
    let book = book_file(&dir);
    bookpress(&dir)
        .arg("-b")
        .arg(&book)
        .arg("-o")
        .arg("winter.epub")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully saved EPUB"));
    let bytes = fs::read(dir.path().join("winter.epub")).unwrap();
    assert!(bytes.starts_with(b"PK\x03\x04"));
}
