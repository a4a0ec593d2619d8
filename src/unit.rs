//! Units of generation work and their position-derived identities.
//!
//! A unit is one generator call and one output file: a part introduction, a section,
//! or a whole bullet-driven chapter. Identity and destination path come purely from
//! position in the plan, so the same plan always maps to the same files.

use crate::plan::{BookLanguage, BookPlan, ChapterBody, WordRange};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Back cover file at the store root. Written verbatim, never generated.
pub const BACK_COVER_FILE: &str = "back_cover.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    PartIntro,
    Section,
    Chapter,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitKind::PartIntro => "part-intro",
            UnitKind::Section => "section",
            UnitKind::Chapter => "chapter",
        };
        f.write_str(label)
    }
}

/// Position of a unit in the plan. All indices are 1-based; chapter numbers run
/// continuously across parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UnitId {
    pub kind: UnitKind,
    pub part: usize,
    pub chapter: Option<usize>,
    pub section: Option<usize>,
}

impl UnitId {
    pub fn part_intro(part: usize) -> Self {
        Self {
            kind: UnitKind::PartIntro,
            part,
            chapter: None,
            section: None,
        }
    }

    pub fn chapter(part: usize, chapter: usize) -> Self {
        Self {
            kind: UnitKind::Chapter,
            part,
            chapter: Some(chapter),
            section: None,
        }
    }

    pub fn section(part: usize, chapter: usize, section: usize) -> Self {
        Self {
            kind: UnitKind::Section,
            part,
            chapter: Some(chapter),
            section: Some(section),
        }
    }

    /// Destination relative to the book's output root.
    pub fn destination(&self) -> PathBuf {
        let part_dir = format!("part_{:02}", self.part);
        let file = match (self.kind, self.chapter, self.section) {
            (UnitKind::Section, Some(chapter), Some(section)) => {
                format!("{:02}_{:02}_{:02}_section.md", self.part, chapter, section)
            }
            (UnitKind::Chapter, Some(chapter), _) => {
                format!("{:02}_{:02}_chapter.md", self.part, chapter)
            }
            _ => format!("_part_{:02}_intro.md", self.part),
        };
        PathBuf::from(part_dir).join(file)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.chapter, self.section) {
            (Some(chapter), Some(section)) => {
                write!(f, "{} {}.{}.{}", self.kind, self.part, chapter, section)
            }
            (Some(chapter), None) => write!(f, "{} {}.{}", self.kind, self.part, chapter),
            _ => write!(f, "{} {}", self.kind, self.part),
        }
    }
}

/// Book-level facts shared by every unit's prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct BookContext {
    pub title: String,
    pub language: BookLanguage,
    pub target_reader: String,
    pub tone: String,
}

/// Everything needed to build one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub destination: PathBuf,
    pub book: BookContext,
    pub part_name: String,
    pub part_introduction: String,
    pub chapter_name: Option<String>,
    pub section_name: Option<String>,
    pub outline: Vec<String>,
    pub word_range: WordRange,
    /// Chapter list with this unit's chapter marked as current.
    pub book_progress: String,
    /// Section list with this unit's section marked as current (sections only).
    pub chapter_progress: Option<String>,
    /// Destination of the unit generated just before this one, if any.
    pub preceding: Option<PathBuf>,
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        self.id.kind
    }

    /// Name shown in logs and progress lines.
    pub fn title(&self) -> &str {
        match self.id.kind {
            UnitKind::Section => self.section_name.as_deref().unwrap_or(&self.part_name),
            UnitKind::Chapter => self.chapter_name.as_deref().unwrap_or(&self.part_name),
            UnitKind::PartIntro => &self.part_name,
        }
    }

    /// Final document: heading followed by the generated text.
    pub fn render(&self, text: &str) -> String {
        let heading = match self.id.kind {
            UnitKind::Chapter => format!(
                "# {}. {}",
                self.id.chapter.unwrap_or_default(),
                self.title()
            ),
            UnitKind::Section => format!("## {}", self.title()),
            UnitKind::PartIntro => format!(
                "# {} {}: {}",
                self.book.language.part_label(),
                self.id.part,
                self.part_name
            ),
        };
        format!("{}\n\n{}\n", heading, text.trim())
    }
}

/// Render a progress outline: done items checked, the current item marked, the rest open.
pub fn progress_outline<S: AsRef<str>>(names: &[S], current: usize) -> String {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = name.as_ref();
            if index < current {
                format!("[x] {}", name)
            } else if index == current {
                format!("[ ] {} <-- YOU'RE CURRENTLY HERE", name)
            } else {
                format!("[ ] {}", name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten a plan into units in document order: for each part its introduction, then
/// each chapter's sections (or the chapter itself when it is bullet-driven).
pub fn enumerate(plan: &BookPlan) -> Vec<Unit> {
    let book = BookContext {
        title: plan.name.clone(),
        language: plan.book_language,
        target_reader: plan.target_reader.clone(),
        tone: plan.tone.clone(),
    };
    let chapter_names: Vec<&str> = plan
        .parts
        .iter()
        .flat_map(|p| p.chapters.iter().map(|c| c.name.as_str()))
        .collect();

    let mut units: Vec<Unit> = Vec::new();
    let mut chapter_number = 0usize;

    for (part_offset, part) in plan.parts.iter().enumerate() {
        let part_number = part_offset + 1;
        let intro_progress = progress_outline(&chapter_names, chapter_number);
        push_unit(
            &mut units,
            Unit {
                id: UnitId::part_intro(part_number),
                destination: UnitId::part_intro(part_number).destination(),
                book: book.clone(),
                part_name: part.name.clone(),
                part_introduction: part.introduction.clone(),
                chapter_name: None,
                section_name: None,
                outline: part.chapters.iter().map(|c| c.name.clone()).collect(),
                word_range: WordRange::PART_INTRO,
                book_progress: intro_progress,
                chapter_progress: None,
                preceding: None,
            },
        );

        for chapter in &part.chapters {
            chapter_number += 1;
            let book_progress = progress_outline(&chapter_names, chapter_number - 1);
            match &chapter.body {
                ChapterBody::Sectioned(sections) => {
                    let section_names: Vec<&str> =
                        sections.iter().map(|s| s.name.as_str()).collect();
                    for (section_offset, section) in sections.iter().enumerate() {
                        let id = UnitId::section(part_number, chapter_number, section_offset + 1);
                        push_unit(
                            &mut units,
                            Unit {
                                id,
                                destination: id.destination(),
                                book: book.clone(),
                                part_name: part.name.clone(),
                                part_introduction: part.introduction.clone(),
                                chapter_name: Some(chapter.name.clone()),
                                section_name: Some(section.name.clone()),
                                outline: section.bullet_points.clone(),
                                word_range: section.word_range,
                                book_progress: book_progress.clone(),
                                chapter_progress: Some(progress_outline(
                                    &section_names,
                                    section_offset,
                                )),
                                preceding: None,
                            },
                        );
                    }
                }
                ChapterBody::BulletDriven {
                    bullet_points,
                    word_range,
                } => {
                    let id = UnitId::chapter(part_number, chapter_number);
                    push_unit(
                        &mut units,
                        Unit {
                            id,
                            destination: id.destination(),
                            book: book.clone(),
                            part_name: part.name.clone(),
                            part_introduction: part.introduction.clone(),
                            chapter_name: Some(chapter.name.clone()),
                            section_name: None,
                            outline: bullet_points.clone(),
                            word_range: *word_range,
                            book_progress,
                            chapter_progress: None,
                            preceding: None,
                        },
                    );
                }
            }
        }
    }
    units
}

fn push_unit(units: &mut Vec<Unit>, mut unit: Unit) {
    unit.preceding = units.last().map(|prev| prev.destination.clone());
    units.push(unit);
}
