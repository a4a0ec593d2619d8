//! Loading plans from disk and rejecting malformed ones before any generation.

use bookwright::error::PlanError;
use bookwright::plan::{BookLanguage, BookPlan, ChapterBody, WordRange};
use bookwright::unit::enumerate;
use std::fs;
use tempfile::TempDir;

fn load(yaml: &str) -> Result<BookPlan, PlanError> {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("plan.yaml");
    fs::write(&path, yaml).unwrap();
    BookPlan::load(&path)
}

#[test]
fn test_load_mixed_chapter_shapes() {
    let plan = load(
        r#"
book_language: de
name: "Die Zelle"
target_reader: "Studierende"
back_cover_description: "Ein Buch."
parts:
  - name: "Grundlagen"
    introduction: "Worum es geht."
    chapters:
      - name: "Membran"
        sections:
          - name: "Lipide"
            bullet_points: ["Doppelschicht"]
            min_words: 500
            max_words: 700
      - name: "Kern"
        bullet_points: ["DNA", "Chromatin"]
"#,
    )
    .unwrap();

    assert_eq!(plan.book_language, BookLanguage::De);
    assert_eq!(plan.slug, "die-zelle");
    match &plan.parts[0].chapters[0].body {
        ChapterBody::Sectioned(sections) => {
            assert_eq!(sections[0].word_range, WordRange::new(500, 700))
        }
        other => panic!("unexpected body: {:?}", other),
    }
    match &plan.parts[0].chapters[1].body {
        ChapterBody::BulletDriven { word_range, .. } => assert_eq!(*word_range, WordRange::CHAPTER),
        other => panic!("unexpected body: {:?}", other),
    }

    let destinations: Vec<_> = enumerate(&plan)
        .into_iter()
        .map(|u| u.destination.to_string_lossy().to_string())
        .collect();
    assert_eq!(
        destinations,
        vec![
            "part_01/_part_01_intro.md",
            "part_01/01_01_01_section.md",
            "part_01/01_02_chapter.md",
        ]
    );
}

#[test]
fn test_missing_plan_file() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        BookPlan::load(&temp.path().join("plan.yaml")),
        Err(PlanError::NotFound(_))
    ));
}

#[test]
fn test_unparsable_plan_reports_path() {
    let err = load("name: [unclosed").unwrap_err();
    match err {
        PlanError::Parse { path, .. } => assert!(path.ends_with("plan.yaml")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_chapter_with_both_shapes_is_rejected() {
    let err = load(
        r#"
name: "Book"
target_reader: "Anyone"
parts:
  - name: "P"
    introduction: "I"
    chapters:
      - name: "C"
        bullet_points: ["x"]
        sections:
          - name: "S"
            bullet_points: ["y"]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::AmbiguousChapterBody { .. }));
}

#[test]
fn test_empty_bullets_and_sections_are_rejected() {
    let empty_bullets = load(
        r#"
name: "Book"
target_reader: "Anyone"
parts:
  - name: "P"
    introduction: "I"
    chapters:
      - name: "C"
        sections:
          - name: "S"
            bullet_points: []
"#,
    )
    .unwrap_err();
    assert!(matches!(empty_bullets, PlanError::EmptyBulletPoints { .. }));

    let empty_sections = load(
        r#"
name: "Book"
target_reader: "Anyone"
parts:
  - name: "P"
    introduction: "I"
    chapters:
      - name: "C"
        sections: []
"#,
    )
    .unwrap_err();
    assert!(matches!(empty_sections, PlanError::EmptySections { .. }));
}

#[test]
fn test_missing_target_reader() {
    let err = load(
        r#"
name: "Book"
parts:
  - name: "P"
    introduction: "I"
    chapters:
      - name: "C"
        bullet_points: ["x"]
"#,
    )
    .unwrap_err();
    match err {
        PlanError::MissingField { field, .. } => assert_eq!(field, "target_reader"),
        other => panic!("unexpected error: {:?}", other),
    }
}
