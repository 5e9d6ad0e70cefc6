pub mod errors;
pub mod path;

pub use errors::PathError;
pub use path::{KeyPath, Segment};
