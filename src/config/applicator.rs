//! Changeset applicator - runs a changeset against its target document
//!
//! This module provides file-level application that:
//! - Loads the target (a missing file starts as an empty map)
//! - Applies every edit to a copy and compares it with the original
//! - Writes the result atomically, with an optional backup, only when it changed
//! - Reports the before/after text so callers can show a diff

use crate::config::loader::{target_format, target_path, DefinitionFile};
use crate::config::schema::ChangesetDefinition;
use crate::file::{self, FileError, Format};
use crate::keypath::PathError;
use crate::patch::{apply_changeset, Changeset, PatchError};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// How a changeset should be run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyMode {
    /// Compute the result but never write (check mode).
    pub dry_run: bool,
    /// Back up the existing file before writing, in addition to any
    /// definition that asks for it.
    pub backup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    /// The document changed and was written.
    Updated,
    /// The document would change; nothing was written.
    WouldUpdate,
    /// Every edit was already in place.
    Unchanged,
}

/// Outcome of running one changeset against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ApplyReport should be checked for the changed status"]
pub struct ApplyReport {
    pub file: PathBuf,
    pub status: ApplyStatus,
    /// Number of edits in the changeset.
    pub edits: usize,
    /// File content before patching (empty when the file did not exist).
    pub before: String,
    /// Content that was (or would be) written.
    pub after: String,
    pub backup: Option<PathBuf>,
}

impl ApplyReport {
    pub fn changed(&self) -> bool {
        !matches!(self.status, ApplyStatus::Unchanged)
    }

    pub fn message(&self) -> String {
        match self.status {
            ApplyStatus::Updated => format!("File '{}' updated successfully.", self.file.display()),
            ApplyStatus::WouldUpdate => {
                "Changes would have been made (check mode).".to_string()
            }
            ApplyStatus::Unchanged => "No changes were required.".to_string(),
        }
    }
}

/// Errors during changeset application
#[derive(Debug)]
pub enum ApplicationError {
    /// Reading, parsing, rendering, backing up or writing the target failed
    File(FileError),
    /// A path expression in the changeset is malformed
    Path(PathError),
    /// An edit conflicts with the shape of the document
    Patch { file: PathBuf, source: PatchError },
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::File(e) => write!(f, "{}", e),
            ApplicationError::Path(e) => write!(f, "invalid path expression: {}", e),
            ApplicationError::Patch { file, source } => write!(
                f,
                "error applying change for '{}' to {}: {}",
                source.path_expression(),
                file.display(),
                source
            ),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::File(e) => Some(e),
            ApplicationError::Path(e) => Some(e),
            ApplicationError::Patch { source, .. } => Some(source),
        }
    }
}

impl From<FileError> for ApplicationError {
    fn from(e: FileError) -> Self {
        ApplicationError::File(e)
    }
}

impl From<PathError> for ApplicationError {
    fn from(e: PathError) -> Self {
        ApplicationError::Path(e)
    }
}

/// Apply a changeset definition.
///
/// # Arguments
///
/// * `definition` - The validated changeset definition
/// * `base_dir` - Directory relative target paths are resolved against
///   (normally the directory holding the definition file)
/// * `mode` - Dry-run and backup switches from the caller
pub fn apply_definition(
    definition: &ChangesetDefinition,
    base_dir: &Path,
    mode: ApplyMode,
) -> Result<ApplyReport, ApplicationError> {
    let changeset = definition.changeset()?;
    let file = target_path(definition, base_dir);
    let format = target_format(definition, &file);
    let mode = ApplyMode {
        dry_run: mode.dry_run,
        backup: mode.backup || definition.target.backup,
    };

    tracing::debug!(
        name = definition.display_name(),
        file = %file.display(),
        %format,
        "applying changeset definition"
    );
    apply_to_file(&file, format, &changeset, mode)
}

/// Check a changeset definition without touching the filesystem.
///
/// Mirrors `apply_definition` result semantics, with `WouldUpdate` in place
/// of `Updated`.
pub fn check_definition(
    definition: &ChangesetDefinition,
    base_dir: &Path,
) -> Result<ApplyReport, ApplicationError> {
    apply_definition(
        definition,
        base_dir,
        ApplyMode {
            dry_run: true,
            backup: false,
        },
    )
}

impl DefinitionFile {
    /// Apply this definition to its target.
    pub fn apply(&self, mode: ApplyMode) -> Result<ApplyReport, ApplicationError> {
        apply_definition(&self.definition, self.base_dir(), mode)
    }

    /// Report what applying would do, without writing.
    pub fn check(&self) -> Result<ApplyReport, ApplicationError> {
        check_definition(&self.definition, self.base_dir())
    }
}

/// Apply `changeset` to the document stored at `file`.
///
/// Nothing is written unless the document changed; a failing edit aborts
/// before anything reaches the disk.
pub fn apply_to_file(
    file: &Path,
    format: Format,
    changeset: &Changeset,
    mode: ApplyMode,
) -> Result<ApplyReport, ApplicationError> {
    let loaded = file::load_document(file, format)?;
    let outcome =
        apply_changeset(&loaded.document, changeset).map_err(|source| ApplicationError::Patch {
            file: file.to_path_buf(),
            source,
        })?;

    let before = loaded.content.clone().unwrap_or_default();

    if !outcome.changed {
        tracing::debug!(file = %file.display(), "no changes required");
        return Ok(ApplyReport {
            file: file.to_path_buf(),
            status: ApplyStatus::Unchanged,
            edits: changeset.len(),
            after: before.clone(),
            before,
            backup: None,
        });
    }

    let after = format.render(&outcome.document)?;

    if mode.dry_run {
        return Ok(ApplyReport {
            file: file.to_path_buf(),
            status: ApplyStatus::WouldUpdate,
            edits: changeset.len(),
            before,
            after,
            backup: None,
        });
    }

    let backup = if mode.backup && loaded.exists() {
        Some(file::create_backup(file)?)
    } else {
        None
    };

    file::write_atomic(file, after.as_bytes())?;

    Ok(ApplyReport {
        file: file.to_path_buf(),
        status: ApplyStatus::Updated,
        edits: changeset.len(),
        before,
        after,
        backup,
    })
}
