//! Output store: the book's file tree, which is both the deliverable and the
//! resumability ledger. A unit is done exactly when its destination holds a complete
//! document.
//!
//! Writes are atomic: content goes to a hidden sibling temp file, is flushed and
//! synced, then renamed over the destination. A crash before the rename leaves the
//! destination absent, never partial.

use crate::error::StorageError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Smallest document accepted as complete. Anything shorter is treated as a leftover.
pub const DEFAULT_MIN_COMPLETE_BYTES: u64 = 16;

pub trait OutputStore: Send + Sync {
    /// Whether the destination already holds a complete document.
    fn is_complete(&self, destination: &Path) -> bool;

    /// Atomically write `content` to the destination, replacing any previous file.
    fn persist(&self, destination: &Path, content: &str) -> Result<PathBuf, StorageError>;

    /// Read a document, `None` when it does not exist.
    fn read(&self, destination: &Path) -> Result<Option<String>, StorageError>;
}

/// Result of inspecting a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Missing,
    NotAFile,
    TooShort,
    NotUtf8,
    Blank,
    Complete,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completion::Complete)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Completion::Missing => "missing",
            Completion::NotAFile => "not a file",
            Completion::TooShort => "too short",
            Completion::NotUtf8 => "not utf-8",
            Completion::Blank => "blank",
            Completion::Complete => "done",
        }
    }
}

/// Filesystem-backed store rooted at a book directory.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
    min_complete_bytes: u64,
}

impl FileSystemStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StorageError::WriteFailed {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            min_complete_bytes: DEFAULT_MIN_COMPLETE_BYTES,
        })
    }

    pub fn with_min_complete_bytes(mut self, min_complete_bytes: u64) -> Self {
        self.min_complete_bytes = min_complete_bytes.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a destination. Destinations must stay inside the root.
    pub fn resolve(&self, destination: &Path) -> Result<PathBuf, StorageError> {
        let escapes = destination.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || destination.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(destination.display().to_string()));
        }
        Ok(self.root.join(destination))
    }

    /// Inspect a destination without reading more than needed.
    pub fn completion(&self, destination: &Path) -> Result<Completion, StorageError> {
        let path = self.resolve(destination)?;
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Completion::Missing),
            Err(source) => return Err(StorageError::ReadFailed { path, source }),
        };
        if !metadata.is_file() {
            return Ok(Completion::NotAFile);
        }
        if metadata.len() < self.min_complete_bytes {
            return Ok(Completion::TooShort);
        }
        let bytes = fs::read(&path).map_err(|source| StorageError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return Ok(Completion::NotUtf8),
        };
        if text.trim().is_empty() {
            return Ok(Completion::Blank);
        }
        Ok(Completion::Complete)
    }

    /// Write content to the temp sibling of `destination` without publishing it.
    pub fn stage(&self, destination: &Path, content: &str) -> Result<StagedWrite, StorageError> {
        let final_path = self.resolve(destination)?;
        let file_name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| StorageError::InvalidPath(destination.display().to_string()))?;
        let parent = final_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent).map_err(|source| StorageError::WriteFailed {
            path: parent.clone(),
            source,
        })?;

        let temp_path = parent.join(format!(".{}.tmp", file_name));
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.flush()?;
            file.sync_all()
        };
        if let Err(source) = write() {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::WriteFailed {
                path: temp_path,
                source,
            });
        }

        Ok(StagedWrite {
            temp_path,
            final_path,
            committed: false,
        })
    }
}

impl OutputStore for FileSystemStore {
    fn is_complete(&self, destination: &Path) -> bool {
        match self.completion(destination) {
            Ok(completion) => completion.is_complete(),
            Err(e) => {
                warn!(destination = %destination.display(), error = %e, "Treating unreadable output as incomplete");
                false
            }
        }
    }

    fn persist(&self, destination: &Path, content: &str) -> Result<PathBuf, StorageError> {
        self.stage(destination, content)?.commit()
    }

    fn read(&self, destination: &Path) -> Result<Option<String>, StorageError> {
        let path = self.resolve(destination)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ReadFailed { path, source }),
        }
    }
}

/// A fully written temp file waiting to be renamed into place.
///
/// Dropping without [`StagedWrite::commit`] removes the temp file and leaves the
/// destination untouched.
#[derive(Debug)]
pub struct StagedWrite {
    temp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn commit(mut self) -> Result<PathBuf, StorageError> {
        fs::rename(&self.temp_path, &self.final_path).map_err(|source| {
            StorageError::WriteFailed {
                path: self.final_path.clone(),
                source,
            }
        })?;
        self.committed = true;
        sync_parent_dir(&self.final_path);
        debug!(path = %self.final_path.display(), "Persisted output");
        Ok(self.final_path.clone())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
