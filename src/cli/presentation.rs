//! CLI presentation: text and json formatters per command.

use crate::error::ApiError;
use crate::executor::{BackCoverStatus, RunState};
use crate::library::{BookEntry, UnitStatus};
use crate::plan::BookPlan;
use crate::store::Completion;
use crate::unit::{Unit, UnitKind};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}

pub fn format_book_list(books: &[BookEntry], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&json!({ "books": books, "total": books.len() }));
    }
    if books.is_empty() {
        return Ok("No books found. Create <books_root>/<name>/plan.yaml to add one.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Book", "State", "Directory"]);
    for book in books {
        let state = if book.ready { "ready" } else { "pending" };
        table.add_row(vec![
            book.name.clone(),
            state.to_string(),
            book.dir.display().to_string(),
        ]);
    }
    Ok(format!(
        "{}\n\n{}\n\nTotal: {} book(s)",
        format_section_heading("Books"),
        table,
        books.len()
    ))
}

pub fn format_validation(book: &str, plan: &BookPlan, units: &[Unit]) -> String {
    let count = |kind: UnitKind| units.iter().filter(|u| u.kind() == kind).count();
    format!(
        "Plan for '{}' is valid:\n  Title: {}\n  Language: {}\n  Parts: {}\n  Chapters: {}\n  Units: {} ({} part intros, {} chapters, {} sections)",
        book,
        plan.name,
        plan.book_language.code(),
        plan.parts.len(),
        plan.chapter_count(),
        units.len(),
        count(UnitKind::PartIntro),
        count(UnitKind::Chapter),
        count(UnitKind::Section),
    )
}

pub fn format_book_status(
    book: &BookEntry,
    plan: &BookPlan,
    statuses: &[UnitStatus],
    format: &str,
) -> Result<String, ApiError> {
    let done = statuses
        .iter()
        .filter(|s| s.completion == Completion::Complete)
        .count();
    if format == "json" {
        return to_json(&json!({
            "book": book.name,
            "title": plan.name,
            "ready": book.ready,
            "total": statuses.len(),
            "done": done,
            "units": statuses,
        }));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Unit", "Title", "Status", "File"]);
    for status in statuses {
        table.add_row(vec![
            status.unit.clone(),
            status.title.clone(),
            status.completion.label().to_string(),
            status.destination.display().to_string(),
        ]);
    }
    let mut out = format!(
        "{}\n\n{}\n\n{}/{} units written",
        format_section_heading(&format!("{} ({})", plan.name, book.name)),
        table,
        done,
        statuses.len()
    );
    if book.ready {
        out.push_str("\nBook is marked ready.");
    }
    Ok(out)
}

pub fn format_run_summary(book: &str, state: &RunState) -> String {
    let headline = if !state.is_complete() {
        let mut headline = format!(
            "Book '{}' incomplete: {} failed, {} not dispatched",
            book, state.failed, state.not_dispatched
        );
        if state.cancelled {
            headline.push_str(" (interrupted)");
        }
        headline.push('.');
        headline
    } else if state.skipped == state.total && state.back_cover != BackCoverStatus::Written {
        format!("Book '{}' is already complete; nothing to generate.", book)
    } else {
        format!("Book '{}' generated.", book)
    };
    format!("{}\n{}", headline, state.summary())
}
