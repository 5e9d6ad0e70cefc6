pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_definition, apply_to_file, check_definition, ApplicationError, ApplyMode, ApplyReport,
    ApplyStatus,
};
pub use loader::{load_from_path, load_from_str, target_path, ConfigError, DefinitionFile};
pub use schema::{
    ChangesetDefinition, EditDefinition, Metadata, Target, ValidationError, ValidationIssue,
};
