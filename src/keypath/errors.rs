use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path expression '{input}' contains no segments")]
    Empty { input: String },

    #[error("negative sequence index {index} in path expression '{input}'")]
    NegativeIndex { input: String, index: String },

    #[error("sequence index {index} in path expression '{input}' is out of range")]
    IndexOverflow { input: String, index: String },
}
