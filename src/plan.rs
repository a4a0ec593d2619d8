//! Book plan: the immutable Part → Chapter → (Section | bullet points) tree read from
//! `plan.yaml`.
//!
//! The YAML shape lets a chapter carry either `sections:` or `bullet_points:`. Loading
//! maps that into the tagged [`ChapterBody`] so enumeration never has to guess which
//! shape it is looking at.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const MAX_SLUG_LEN: usize = 50;
const DEFAULT_TONE: &str = "popular science";

/// Target length of a generated unit, in words. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub min: u32,
    pub max: u32,
}

impl WordRange {
    pub const SECTION: WordRange = WordRange { min: 800, max: 1200 };
    pub const CHAPTER: WordRange = WordRange { min: 3000, max: 5000 };
    pub const PART_INTRO: WordRange = WordRange { min: 80, max: 150 };

    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, words: usize) -> bool {
        words >= self.min as usize && words <= self.max as usize
    }

    fn from_bounds(min: Option<u32>, max: Option<u32>, default: WordRange) -> Self {
        Self {
            min: min.unwrap_or(default.min),
            max: max.unwrap_or(default.max),
        }
    }

    fn validate(&self, location: &str) -> Result<(), PlanError> {
        if self.max == 0 || self.min > self.max {
            return Err(PlanError::InvalidWordRange {
                location: location.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl fmt::Display for WordRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Language the book is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookLanguage {
    #[default]
    En,
    Ru,
    De,
}

impl BookLanguage {
    pub fn code(&self) -> &'static str {
        match self {
            BookLanguage::En => "en",
            BookLanguage::Ru => "ru",
            BookLanguage::De => "de",
        }
    }

    /// English name of the language, used in generation instructions.
    pub fn display_name(&self) -> &'static str {
        match self {
            BookLanguage::En => "English",
            BookLanguage::Ru => "Russian",
            BookLanguage::De => "German",
        }
    }

    /// Word used for "Part" in part introduction headings.
    pub fn part_label(&self) -> &'static str {
        match self {
            BookLanguage::En => "Part",
            BookLanguage::Ru => "Часть",
            BookLanguage::De => "Teil",
        }
    }
}

impl std::str::FromStr for BookLanguage {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(BookLanguage::En),
            "ru" => Ok(BookLanguage::Ru),
            "de" => Ok(BookLanguage::De),
            other => Err(PlanError::UnsupportedLanguage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlan {
    pub name: String,
    pub bullet_points: Vec<String>,
    pub word_range: WordRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChapterBody {
    /// Each section becomes its own generated unit.
    Sectioned(Vec<SectionPlan>),
    /// The whole chapter is generated in one call from its outline.
    BulletDriven {
        bullet_points: Vec<String>,
        word_range: WordRange,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterPlan {
    pub name: String,
    pub body: ChapterBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartPlan {
    pub name: String,
    pub introduction: String,
    pub chapters: Vec<ChapterPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookPlan {
    pub book_language: BookLanguage,
    pub name: String,
    pub slug: String,
    pub target_reader: String,
    pub back_cover_description: String,
    pub tone: String,
    pub parts: Vec<PartPlan>,
}

impl BookPlan {
    /// Load and validate a plan from a YAML file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        if !path.is_file() {
            return Err(PlanError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|err| match err {
            PlanError::Parse { message, .. } => PlanError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate a plan from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, PlanError> {
        let raw: RawBookPlan = serde_yaml::from_str(text).map_err(|e| PlanError::Parse {
            path: Path::new("<inline>").to_path_buf(),
            message: e.to_string(),
        })?;
        let plan = raw.into_plan()?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check structural invariants. Returns the first violation found.
    pub fn validate(&self) -> Result<(), PlanError> {
        require_text("book", "name", &self.name)?;
        require_text("book", "target_reader", &self.target_reader)?;
        validate_slug(&self.slug)?;
        if self.parts.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        for (part_index, part) in self.parts.iter().enumerate() {
            let part_loc = format!("part {}", part_index + 1);
            require_text(&part_loc, "name", &part.name)?;
            require_text(&part_loc, "introduction", &part.introduction)?;
            if part.chapters.is_empty() {
                return Err(PlanError::EmptyChapters { location: part_loc });
            }

            for (chapter_index, chapter) in part.chapters.iter().enumerate() {
                let chapter_loc = format!("{} chapter {}", part_loc, chapter_index + 1);
                require_text(&chapter_loc, "name", &chapter.name)?;
                match &chapter.body {
                    ChapterBody::Sectioned(sections) => {
                        if sections.is_empty() {
                            return Err(PlanError::EmptySections {
                                location: chapter_loc,
                            });
                        }
                        for (section_index, section) in sections.iter().enumerate() {
                            let section_loc =
                                format!("{} section {}", chapter_loc, section_index + 1);
                            require_text(&section_loc, "name", &section.name)?;
                            require_bullets(&section_loc, &section.bullet_points)?;
                            section.word_range.validate(&section_loc)?;
                        }
                    }
                    ChapterBody::BulletDriven {
                        bullet_points,
                        word_range,
                    } => {
                        require_bullets(&chapter_loc, bullet_points)?;
                        word_range.validate(&chapter_loc)?;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn chapter_count(&self) -> usize {
        self.parts.iter().map(|p| p.chapters.len()).sum()
    }
}

/// Derive a filesystem-safe slug from a title: lowercase ASCII alphanumerics joined by `-`.
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let mut slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "book".to_string()
    } else {
        slug
    }
}

fn validate_slug(slug: &str) -> Result<(), PlanError> {
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PlanError::InvalidSlug(slug.to_string()))
    }
}

fn require_text(location: &str, field: &str, value: &str) -> Result<(), PlanError> {
    if value.trim().is_empty() {
        return Err(PlanError::MissingField {
            location: location.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_bullets(location: &str, bullets: &[String]) -> Result<(), PlanError> {
    if bullets.iter().all(|b| b.trim().is_empty()) {
        return Err(PlanError::EmptyBulletPoints {
            location: location.to_string(),
        });
    }
    Ok(())
}

// YAML shape. Every field is optional here so a missing one is reported with its
// location instead of a bare serde message.

#[derive(Debug, Deserialize)]
struct RawBookPlan {
    #[serde(default)]
    book_language: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    target_reader: Option<String>,
    #[serde(default)]
    back_cover_description: Option<String>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    introduction: Option<String>,
    #[serde(default)]
    chapters: Vec<RawChapter>,
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sections: Option<Vec<RawSection>>,
    #[serde(default)]
    bullet_points: Option<Vec<String>>,
    #[serde(default)]
    min_words: Option<u32>,
    #[serde(default)]
    max_words: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bullet_points: Vec<String>,
    #[serde(default)]
    min_words: Option<u32>,
    #[serde(default)]
    max_words: Option<u32>,
}

fn required(location: &str, field: &str, value: Option<String>) -> Result<String, PlanError> {
    value.ok_or_else(|| PlanError::MissingField {
        location: location.to_string(),
        field: field.to_string(),
    })
}

impl RawBookPlan {
    fn into_plan(self) -> Result<BookPlan, PlanError> {
        let name = required("book", "name", self.name)?;
        let book_language = match self.book_language {
            Some(code) => code.parse()?,
            None => BookLanguage::default(),
        };
        let slug = self.slug.unwrap_or_else(|| derive_slug(&name));
        let tone = self
            .tone
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TONE.to_string());

        let parts = self
            .parts
            .into_iter()
            .enumerate()
            .map(|(index, part)| part.into_part(index + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BookPlan {
            book_language,
            name,
            slug,
            target_reader: required("book", "target_reader", self.target_reader)?,
            back_cover_description: self.back_cover_description.unwrap_or_default(),
            tone,
            parts,
        })
    }
}

impl RawPart {
    fn into_part(self, part_number: usize) -> Result<PartPlan, PlanError> {
        let location = format!("part {}", part_number);
        let chapters = self
            .chapters
            .into_iter()
            .enumerate()
            .map(|(index, chapter)| {
                chapter.into_chapter(&format!("{} chapter {}", location, index + 1))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PartPlan {
            name: required(&location, "name", self.name)?,
            introduction: required(&location, "introduction", self.introduction)?,
            chapters,
        })
    }
}

impl RawChapter {
    fn into_chapter(self, location: &str) -> Result<ChapterPlan, PlanError> {
        let name = required(location, "name", self.name)?;
        let body = match (self.sections, self.bullet_points) {
            (Some(_), Some(_)) => {
                return Err(PlanError::AmbiguousChapterBody {
                    location: location.to_string(),
                })
            }
            (None, None) => {
                return Err(PlanError::MissingChapterBody {
                    location: location.to_string(),
                })
            }
            (Some(sections), None) => ChapterBody::Sectioned(
                sections
                    .into_iter()
                    .enumerate()
                    .map(|(index, section)| {
                        section.into_section(&format!("{} section {}", location, index + 1))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            (None, Some(bullet_points)) => ChapterBody::BulletDriven {
                bullet_points,
                word_range: WordRange::from_bounds(
                    self.min_words,
                    self.max_words,
                    WordRange::CHAPTER,
                ),
            },
        };
        Ok(ChapterPlan { name, body })
    }
}

impl RawSection {
    fn into_section(self, location: &str) -> Result<SectionPlan, PlanError> {
        Ok(SectionPlan {
            name: required(location, "name", self.name)?,
            bullet_points: self.bullet_points,
            word_range: WordRange::from_bounds(self.min_words, self.max_words, WordRange::SECTION),
        })
    }
}
