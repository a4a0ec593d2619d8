//! Crash-safety of the output store.

use bookwright::store::{Completion, FileSystemStore, OutputStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_interrupted_write_leaves_no_destination() {
    let temp = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp.path()).unwrap();
    let dest = Path::new("part_02/02_03_chapter.md");

    let staged = store
        .stage(dest, "# 3. Chemistry\n\nA chapter that never got renamed.\n")
        .unwrap();
    assert!(staged.temp_path().exists());
    assert!(!store.root().join(dest).exists());
    drop(staged);

    assert_eq!(store.completion(dest).unwrap(), Completion::Missing);
    assert!(!store.is_complete(dest));
}

#[test]
fn test_stray_temp_file_is_not_a_document() {
    let temp = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp.path()).unwrap();
    let dir = store.root().join("part_01");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".01_01_01_section.md.tmp"), "half written section text").unwrap();

    let dest = Path::new("part_01/01_01_01_section.md");
    assert!(!store.is_complete(dest));

    store.persist(dest, "## Lipids\n\nComplete text.\n").unwrap();
    assert!(store.is_complete(dest));
    assert!(!dir.join(".01_01_01_section.md.tmp").exists());
}

#[test]
fn test_persist_creates_part_directories() {
    let temp = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp.path().join("book")).unwrap();
    let written = store
        .persist(Path::new("part_07/_part_07_intro.md"), "# Part 7: Late\n\nIntro.\n")
        .unwrap();
    assert_eq!(written, temp.path().join("book/part_07/_part_07_intro.md"));
    assert_eq!(
        store.read(Path::new("part_07/_part_07_intro.md")).unwrap().as_deref(),
        Some("# Part 7: Late\n\nIntro.\n")
    );
}
