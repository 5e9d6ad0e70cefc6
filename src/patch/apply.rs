//! Structural patching: walk a document along a [`KeyPath`], creating
//! missing maps and sequences, then assign the value at the terminal
//! segment.

use crate::document::{ContainerKind, Node, NodeKind};
use crate::keypath::{KeyPath, Segment};
use crate::patch::errors::PatchError;

/// Set `value` at `path` inside `root`.
///
/// Missing map keys are created holding empty maps, short sequences are
/// padded with nulls, and a null sequence slot that must be walked through
/// becomes an empty map. The only shape repair ever made is turning an empty
/// map into an empty sequence or back (see [`coerce`]).
///
/// On error `root` may hold intermediate containers created before the
/// conflicting segment; callers wanting all-or-nothing semantics should go
/// through [`crate::patch::apply_changeset`].
pub fn apply_edit(root: &mut Node, path: &KeyPath, value: Node) -> Result<(), PatchError> {
    let mut cursor = root;
    for segment in path.traversal() {
        cursor = descend(cursor, segment, path)?;
    }
    assign(cursor, path.terminal(), path, value)
}

/// Make `node` the container kind `segment` needs.
///
/// Nodes already of the right kind are left alone. An empty map or empty
/// sequence is replaced by an empty container of the required kind. Anything
/// else (non-empty containers and every scalar, null included) is a
/// [`PatchError::TypeConflict`].
pub fn coerce(node: &mut Node, segment: &Segment, path: &KeyPath) -> Result<(), PatchError> {
    let required = ContainerKind::for_segment(segment);
    let found = node.kind();

    let satisfied = matches!(
        (required, found),
        (ContainerKind::Map, NodeKind::Map) | (ContainerKind::Sequence, NodeKind::Sequence)
    );
    if satisfied {
        return Ok(());
    }

    if !node.is_empty_container() {
        return Err(conflict(path, segment, required, found));
    }

    tracing::debug!(
        path = %path,
        segment = %segment,
        from = %found,
        to = %required,
        "coercing empty container"
    );
    *node = required.empty();
    Ok(())
}

fn descend<'a>(
    node: &'a mut Node,
    segment: &Segment,
    path: &KeyPath,
) -> Result<&'a mut Node, PatchError> {
    coerce(node, segment, path)?;

    match (segment, node) {
        (Segment::MapKey(key), Node::Map(map)) => Ok(map.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(path = %path, key = %key, "creating missing map");
            Node::empty_map()
        })),
        (Segment::SequenceIndex(index), Node::Sequence(items)) => {
            pad_to(items, *index, path);
            let slot = &mut items[*index];
            if slot.is_null() {
                *slot = Node::empty_map();
            }
            Ok(slot)
        }
        (segment, other) => Err(conflict(
            path,
            segment,
            ContainerKind::for_segment(segment),
            other.kind(),
        )),
    }
}

fn assign(
    node: &mut Node,
    segment: &Segment,
    path: &KeyPath,
    value: Node,
) -> Result<(), PatchError> {
    coerce(node, segment, path)?;

    match (segment, node) {
        (Segment::MapKey(key), Node::Map(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Segment::SequenceIndex(index), Node::Sequence(items)) => {
            pad_to(items, *index, path);
            items[*index] = value;
            Ok(())
        }
        (segment, other) => Err(conflict(
            path,
            segment,
            ContainerKind::for_segment(segment),
            other.kind(),
        )),
    }
}

/// Grow `items` with nulls until `index` is addressable.
fn pad_to(items: &mut Vec<Node>, index: usize, path: &KeyPath) {
    if items.len() <= index {
        tracing::debug!(
            path = %path,
            from = items.len(),
            to = index + 1,
            "padding sequence with nulls"
        );
        items.resize(index + 1, Node::null());
    }
}

fn conflict(
    path: &KeyPath,
    segment: &Segment,
    expected: ContainerKind,
    found: NodeKind,
) -> PatchError {
    PatchError::TypeConflict {
        path: path.as_str().to_string(),
        segment: segment.clone(),
        expected,
        found,
    }
}
