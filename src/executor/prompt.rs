//! Prompt assembly for a unit.

use crate::generator::GenerationRequest;
use crate::unit::{Unit, UnitKind};

/// Build the generator request for `unit`. `context` is the closing excerpt of the
/// preceding unit, empty when that unit is not materialized.
pub fn build_request(unit: &Unit, context: String) -> GenerationRequest {
    GenerationRequest {
        label: unit.id.to_string(),
        instructions: instructions(unit),
        prompt: prompt(unit),
        word_range: unit.word_range,
        context,
    }
}

fn instructions(unit: &Unit) -> String {
    let task = match unit.kind() {
        UnitKind::Section => {
            "Your task is to write one section of a book chapter based on the given outline.\n\
             Cover every bullet point of the outline.\n\
             Output markdown. Use only level-3 (###) headings inside the section; \
             the section title is added automatically."
        }
        UnitKind::Chapter => {
            "Your task is to write a complete book chapter based on the given outline.\n\
             Cover every bullet point of the outline.\n\
             Output markdown. Use level-2 (##) and level-3 (###) headings for sections \
             within the chapter. Do not use level-1 headings; the chapter title is added \
             automatically."
        }
        UnitKind::PartIntro => {
            "Your task is to write the introduction to one part of a book.\n\
             Expand the given summary into a short, inviting introduction that prepares \
             the reader for the chapters of this part.\n\
             Output plain paragraphs without headings; the part title is added automatically."
        }
    };
    format!(
        "{}\n\nThe text should contain approximately {} words.\n\
         The style should be that of a {} book: engaging, informative and accessible.\n\
         Write in {}.",
        task,
        unit.word_range,
        unit.book.tone,
        unit.book.language.display_name()
    )
}

fn prompt(unit: &Unit) -> String {
    let mut lines = vec![
        format!("The book title: {}", unit.book.title),
        format!("The target reader: {}", unit.book.target_reader),
        format!("The book language: {}", unit.book.language.code()),
        String::new(),
        format!("The part name: {}", unit.part_name),
    ];

    match unit.kind() {
        UnitKind::PartIntro => {
            lines.push(format!("The part summary: {}", unit.part_introduction));
            lines.push(String::new());
            lines.push("Chapters in this part:".to_string());
            lines.extend(unit.outline.iter().map(|name| format!("- {}", name)));
        }
        UnitKind::Chapter | UnitKind::Section => {
            if let Some(chapter) = &unit.chapter_name {
                lines.push(format!("The chapter name: {}", chapter));
            }
            if let Some(section) = &unit.section_name {
                lines.push(format!("The section name: {}", section));
            }
            lines.push(String::new());
            lines.push("Outline:".to_string());
            lines.extend(unit.outline.iter().map(|point| format!("- {}", point)));
        }
    }

    lines.push(String::new());
    lines.push(format!("Target length: {} words.", unit.word_range));

    if let Some(chapter_progress) = &unit.chapter_progress {
        lines.push(String::new());
        lines.push("Current chapter progress:".to_string());
        lines.push(chapter_progress.clone());
    }
    lines.push(String::new());
    lines.push("Current book progress:".to_string());
    lines.push(unit.book_progress.clone());

    lines.join("\n")
}

/// Last `max_chars` characters of a document, starting at a line boundary when possible.
pub fn closing_excerpt(document: &str, max_chars: usize) -> String {
    let trimmed = document.trim_end();
    let total = trimmed.chars().count();
    if total <= max_chars {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(total - max_chars).collect();
    match tail.find('\n') {
        Some(index) if index + 1 < tail.len() => tail[index + 1..].to_string(),
        _ => tail,
    }
}
