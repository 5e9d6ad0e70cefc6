//! Doc Patcher: path-addressed edits for structured documents
//!
//! Applies a list of `path = value` assignments to a YAML or JSON document,
//! creating missing maps and sequences on the way, and reports whether the
//! document actually changed.
//!
//! # Architecture
//!
//! - [`keypath`] parses expressions such as `serve.vllm.args[0]` or
//!   `labels["app.kubernetes.io/name"]` into typed segments.
//! - [`patch`] walks a [`Node`] tree along a parsed path and assigns the
//!   value. A whole [`Changeset`] is applied to a copy and compared with the
//!   original, so the changed flag reflects the real structural difference.
//! - [`file`] and [`config`] are the thin outer layers: loading and writing
//!   documents, changeset definition files, dry runs and backups.
//!
//! # Guarantees
//!
//! - A changeset applies completely or not at all
//! - Only empty maps and sequences are ever converted to the other kind
//! - Applying the same changeset twice reports no change the second time
//! - Files are written atomically and only when something changed
//!
//! # Example
//!
//! ```
//! use doc_patcher::{apply_changeset, Changeset, Node};
//!
//! let mut changeset = Changeset::new();
//! changeset.set("serve.vllm.vllm_args[0]", "--tensor-parallel-size")?;
//! changeset.set("serve.vllm.vllm_args[1]", "5")?;
//!
//! let outcome = apply_changeset(&Node::empty_map(), &changeset)?;
//! assert!(outcome.changed);
//!
//! let expected: Node = serde_json::from_str(
//!     r#"{"serve": {"vllm": {"vllm_args": ["--tensor-parallel-size", "5"]}}}"#,
//! )?;
//! assert_eq!(outcome.document, expected);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod document;
pub mod file;
pub mod keypath;
pub mod patch;

// Re-exports
pub use config::{
    apply_definition, apply_to_file, check_definition, load_from_path, load_from_str,
    ApplicationError, ApplyMode, ApplyReport, ApplyStatus, ChangesetDefinition, ConfigError,
    DefinitionFile,
};
pub use document::{ContainerKind, Node, NodeKind, Scalar};
pub use file::{FileError, Format};
pub use keypath::{KeyPath, PathError, Segment};
pub use patch::{
    apply_changeset, apply_changeset_in_place, apply_edit, Changeset, Edit, PatchError,
    PatchOutcome,
};
