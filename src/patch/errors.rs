use crate::document::{ContainerKind, NodeKind};
use crate::keypath::{PathError, Segment};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("cannot apply '{path}': expected a {expected} at segment {segment}, found {found}")]
    TypeConflict {
        path: String,
        segment: Segment,
        expected: ContainerKind,
        found: NodeKind,
    },

    #[error(transparent)]
    Path(#[from] PathError),
}

impl PatchError {
    /// The path expression the failing edit was written with.
    pub fn path_expression(&self) -> &str {
        match self {
            PatchError::TypeConflict { path, .. } => path,
            PatchError::Path(PathError::Empty { input })
            | PatchError::Path(PathError::NegativeIndex { input, .. })
            | PatchError::Path(PathError::IndexOverflow { input, .. }) => input,
        }
    }
}
