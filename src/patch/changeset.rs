use crate::document::Node;
use crate::keypath::{KeyPath, PathError};
use crate::patch::apply::apply_edit;
use crate::patch::errors::PatchError;

/// A single path-to-value assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub path: KeyPath,
    pub value: Node,
}

impl Edit {
    pub fn new(path: KeyPath, value: impl Into<Node>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }

    pub fn parse(expression: &str, value: impl Into<Node>) -> Result<Self, PathError> {
        Ok(Self::new(KeyPath::parse(expression)?, value))
    }
}

/// Ordered list of edits applied as one unit.
///
/// Edits run in the order they were added; each one sees the effect of the
/// ones before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    edits: Vec<Edit>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a changeset from `(path expression, value)` pairs, keeping
    /// their order. Fails on the first unparsable expression.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Node>,
    {
        pairs
            .into_iter()
            .map(|(expression, value)| Edit::parse(expression.as_ref(), value))
            .collect()
    }

    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Parse `expression` and append the edit.
    pub fn set(&mut self, expression: &str, value: impl Into<Node>) -> Result<(), PathError> {
        self.edits.push(Edit::parse(expression, value)?);
        Ok(())
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edit> {
        self.edits.iter()
    }
}

impl FromIterator<Edit> for Changeset {
    fn from_iter<T: IntoIterator<Item = Edit>>(iter: T) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Changeset {
    type Item = &'a Edit;
    type IntoIter = std::slice::Iter<'a, Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

impl IntoIterator for Changeset {
    type Item = Edit;
    type IntoIter = std::vec::IntoIter<Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.into_iter()
    }
}

/// Result of applying a changeset.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "PatchOutcome carries the patched document and the changed flag"]
pub struct PatchOutcome {
    /// The document with every edit applied.
    pub document: Node,
    /// Whether `document` differs structurally from the input.
    pub changed: bool,
}

/// Apply `changeset` to a copy of `original`.
///
/// The first failing edit aborts the whole changeset and `original` is never
/// touched. `changed` comes from a deep comparison of the result with
/// `original`, so edits that write values already present report `false`.
pub fn apply_changeset(original: &Node, changeset: &Changeset) -> Result<PatchOutcome, PatchError> {
    let mut document = original.clone();
    apply_all(&mut document, changeset)?;
    let changed = document != *original;
    tracing::debug!(edits = changeset.len(), changed, "changeset applied");
    Ok(PatchOutcome { document, changed })
}

/// Apply `changeset` directly to `document`, returning the changed flag.
///
/// If any edit fails, `document` is restored to its state before the call.
pub fn apply_changeset_in_place(
    document: &mut Node,
    changeset: &Changeset,
) -> Result<bool, PatchError> {
    let before = document.clone();
    if let Err(err) = apply_all(document, changeset) {
        *document = before;
        return Err(err);
    }
    Ok(*document != before)
}

fn apply_all(document: &mut Node, changeset: &Changeset) -> Result<(), PatchError> {
    for edit in changeset {
        tracing::trace!(path = %edit.path, "applying edit");
        apply_edit(document, &edit.path, edit.value.clone())?;
    }
    Ok(())
}
