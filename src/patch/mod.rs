pub mod apply;
pub mod changeset;
pub mod errors;

pub use apply::{apply_edit, coerce};
pub use changeset::{apply_changeset, apply_changeset_in_place, Changeset, Edit, PatchOutcome};
pub use errors::PatchError;
