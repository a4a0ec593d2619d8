//! Book discovery under the books root.
//!
//! Every direct sub-directory holding a `plan.yaml` is a book; the directory is also
//! the book's output store. A `_ready` flag file marks a finished book.

use crate::error::{ApiError, PlanError};
use crate::plan::BookPlan;
use crate::store::{Completion, FileSystemStore};
use crate::unit::Unit;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const PLAN_FILE: &str = "plan.yaml";
pub const READY_FLAG: &str = "_ready";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookEntry {
    pub name: String,
    pub dir: PathBuf,
    pub ready: bool,
}

impl BookEntry {
    fn from_dir(dir: &Path) -> Option<Self> {
        let name = dir.file_name()?.to_str()?.to_string();
        if !dir.join(PLAN_FILE).is_file() {
            return None;
        }
        Some(Self {
            name,
            dir: dir.to_path_buf(),
            ready: dir.join(READY_FLAG).exists(),
        })
    }

    pub fn plan_path(&self) -> PathBuf {
        self.dir.join(PLAN_FILE)
    }

    pub fn load_plan(&self) -> Result<BookPlan, PlanError> {
        BookPlan::load(&self.plan_path())
    }
}

#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All books, sorted by directory name. A missing root is an empty library.
    pub fn books(&self) -> Result<Vec<BookEntry>, ApiError> {
        if !self.root.is_dir() {
            debug!(root = %self.root.display(), "Books root does not exist");
            return Ok(Vec::new());
        }

        let mut books = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %self.root.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(book) = BookEntry::from_dir(entry.path()) {
                books.push(book);
            }
        }
        Ok(books)
    }

    /// Books that still have work to do.
    pub fn pending_books(&self) -> Result<Vec<BookEntry>, ApiError> {
        Ok(self.books()?.into_iter().filter(|b| !b.ready).collect())
    }

    pub fn open(&self, name: &str) -> Result<BookEntry, ApiError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\');
        if invalid {
            return Err(ApiError::BookNotFound(name.to_string()));
        }
        BookEntry::from_dir(&self.root.join(name))
            .ok_or_else(|| ApiError::BookNotFound(name.to_string()))
    }
}

/// Completion of one unit as found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct UnitStatus {
    pub unit: String,
    pub title: String,
    pub destination: PathBuf,
    pub completion: Completion,
}

/// Inspect every unit without generating anything.
pub fn unit_statuses(units: &[Unit], store: &FileSystemStore) -> Vec<UnitStatus> {
    units
        .iter()
        .map(|unit| {
            let completion = store.completion(&unit.destination).unwrap_or_else(|e| {
                warn!(unit = %unit.id, error = %e, "Could not inspect unit output");
                Completion::Missing
            });
            UnitStatus {
                unit: unit.id.to_string(),
                title: unit.title().to_string(),
                destination: unit.destination.clone(),
                completion,
            }
        })
        .collect()
}
