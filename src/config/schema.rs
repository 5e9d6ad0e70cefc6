use crate::document::Node;
use crate::file::Format;
use crate::keypath::{KeyPath, PathError};
use crate::patch::{Changeset, Edit};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;

/// A changeset definition file: one target document and the edits to make.
///
/// Edits come either from a `[changes]` table (path expression = value, in
/// file order) or from an explicit `[[edits]]` list, never both.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ChangesetDefinition {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub changes: Option<IndexMap<String, Node>>,
    #[serde(default)]
    pub edits: Option<Vec<EditDefinition>>,
}

impl ChangesetDefinition {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.target.file.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "target.file",
            });
        }

        match (&self.changes, &self.edits) {
            (Some(_), Some(_)) => issues.push(ValidationIssue::InvalidCombo {
                message: "use either [changes] or [[edits]], not both".to_string(),
            }),
            (None, None) => issues.push(ValidationIssue::EmptyChangeset),
            (Some(changes), None) if changes.is_empty() => {
                issues.push(ValidationIssue::EmptyChangeset)
            }
            (None, Some(edits)) if edits.is_empty() => issues.push(ValidationIssue::EmptyChangeset),
            _ => {}
        }

        for expression in self.path_expressions() {
            if let Err(error) = KeyPath::parse(expression) {
                issues.push(ValidationIssue::InvalidPath {
                    path: expression.to_string(),
                    error,
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Name for reports: `meta.name`, falling back to the target file.
    pub fn display_name(&self) -> &str {
        if self.meta.name.trim().is_empty() {
            &self.target.file
        } else {
            &self.meta.name
        }
    }

    /// Build the ordered changeset this definition describes.
    pub fn changeset(&self) -> Result<Changeset, PathError> {
        let mut changeset = Changeset::new();
        if let Some(changes) = &self.changes {
            for (expression, value) in changes {
                changeset.push(Edit::parse(expression, value.clone())?);
            }
        }
        if let Some(edits) = &self.edits {
            for edit in edits {
                changeset.push(Edit::parse(&edit.path, edit.value.clone())?);
            }
        }
        Ok(changeset)
    }

    fn path_expressions(&self) -> impl Iterator<Item = &str> {
        let from_table = self
            .changes
            .iter()
            .flat_map(|changes| changes.keys().map(String::as_str));
        let from_list = self
            .edits
            .iter()
            .flat_map(|edits| edits.iter().map(|edit| edit.path.as_str()));
        from_table.chain(from_list)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Target {
    /// Document to edit, relative to the definition file's directory.
    #[serde(default)]
    pub file: String,
    /// Overrides detection by file extension.
    #[serde(default)]
    pub format: Option<Format>,
    /// Copy the existing file aside before writing.
    #[serde(default)]
    pub backup: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub path: String,
    pub value: Node,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyChangeset,
    MissingField { field: &'static str },
    InvalidCombo { message: String },
    InvalidPath { path: String, error: PathError },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyChangeset => write!(f, "changeset definition contains no edits"),
            ValidationIssue::MissingField { field } => {
                write!(f, "changeset definition missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid changeset definition: {message}")
            }
            ValidationIssue::InvalidPath { path, error } => {
                write!(f, "invalid path expression '{path}': {error}")
            }
        }
    }
}
