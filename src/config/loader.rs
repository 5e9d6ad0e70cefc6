//! Loading changeset definition files.
//!
//! A definition is read together with the directory it lives in, since
//! relative `target.file` entries are resolved against that directory.

use crate::config::schema::{ChangesetDefinition, ValidationError};
use crate::file::Format;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read changeset definition from {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse changeset definition{}: {source}", origin(.path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("invalid changeset definition{}: {source}", origin(.path))]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

/// A validated definition and the file it was read from.
#[derive(Debug, Clone)]
pub struct DefinitionFile {
    pub path: PathBuf,
    pub definition: ChangesetDefinition,
}

impl DefinitionFile {
    /// Directory relative target paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// The document this definition edits.
    pub fn target(&self) -> PathBuf {
        target_path(&self.definition, self.base_dir())
    }

    /// Format of the target: the explicit `target.format`, else by extension.
    pub fn format(&self) -> Format {
        target_format(&self.definition, &self.target())
    }

    pub fn name(&self) -> &str {
        self.definition.display_name()
    }
}

/// Resolve the target file of `definition` against `base_dir`. Absolute
/// targets are used as written.
pub fn target_path(definition: &ChangesetDefinition, base_dir: &Path) -> PathBuf {
    let file = Path::new(&definition.target.file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base_dir.join(file)
    }
}

pub(crate) fn target_format(definition: &ChangesetDefinition, target: &Path) -> Format {
    definition
        .target
        .format
        .unwrap_or_else(|| Format::from_path(target))
}

fn parse_definition(input: &str, path: Option<&Path>) -> Result<ChangesetDefinition, ConfigError> {
    let owned = || path.map(Path::to_path_buf);
    let definition: ChangesetDefinition = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: owned(), source })?;
    definition
        .validate()
        .map_err(|source| ConfigError::Validation { path: owned(), source })?;
    Ok(definition)
}

/// Parse and validate definition text that did not come from a file.
pub fn load_from_str(input: &str) -> Result<ChangesetDefinition, ConfigError> {
    parse_definition(input, None)
}

/// Read, parse and validate a definition file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<DefinitionFile, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let definition = parse_definition(&contents, Some(path))?;
    tracing::debug!(path = %path.display(), name = definition.display_name(), "loaded changeset definition");
    Ok(DefinitionFile {
        path: path.to_path_buf(),
        definition,
    })
}
