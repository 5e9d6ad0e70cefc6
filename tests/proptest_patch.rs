//! Property tests for path parsing and changeset application

use doc_patcher::{apply_changeset, Changeset, KeyPath, Node, Segment};
use proptest::prelude::*;

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

fn arb_segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        3 => "[a-c]{1,2}".prop_map(Segment::MapKey),
        1 => (0usize..4).prop_map(Segment::SequenceIndex),
    ]
}

fn arb_value() -> impl Strategy<Value = Node> {
    prop_oneof![
        any::<i64>().prop_map(Node::from),
        any::<bool>().prop_map(Node::from),
        "[a-zA-Z0-9 _-]{0,8}".prop_map(Node::from),
    ]
}

/// Render segments back into a path expression.
fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::MapKey(key) if i == 0 => out.push_str(key),
            Segment::MapKey(key) => {
                out.push('.');
                out.push_str(key);
            }
            Segment::SequenceIndex(index) => out.push_str(&format!("[{index}]")),
        }
    }
    out
}

fn is_proper_prefix(shorter: &[Segment], longer: &[Segment]) -> bool {
    shorter.len() < longer.len() && longer.starts_with(shorter)
}

proptest! {
    #[test]
    fn bare_dotted_keys_parse_to_map_keys(keys in prop::collection::vec(arb_key(), 1..6)) {
        let path = KeyPath::parse(&keys.join(".")).unwrap();
        let expected: Vec<Segment> = keys.iter().map(|k| Segment::key(k.as_str())).collect();
        prop_assert_eq!(path.segments(), expected.as_slice());
    }

    #[test]
    fn quoted_keys_keep_their_dots(head in arb_key(), parts in prop::collection::vec(arb_key(), 2..4)) {
        let quoted = parts.join(".");
        let path = KeyPath::parse(&format!("{head}[\"{quoted}\"]")).unwrap();
        prop_assert_eq!(
            path.segments(),
            &[Segment::key(head.as_str()), Segment::key(quoted.as_str())]
        );
    }

    #[test]
    fn rendered_segments_parse_back(segments in prop::collection::vec(arb_segment(), 1..5)) {
        let path = KeyPath::parse(&render(&segments)).unwrap();
        prop_assert_eq!(path.segments(), segments.as_slice());
    }

    #[test]
    fn padding_fills_with_nulls(index in 0usize..64, value in arb_value()) {
        let changeset = Changeset::from_pairs([(format!("items[{index}]"), value.clone())]).unwrap();
        let outcome = apply_changeset(&Node::empty_map(), &changeset).unwrap();

        let items = outcome.document.get("items").and_then(Node::as_sequence).unwrap();
        prop_assert_eq!(items.len(), index + 1);
        prop_assert!(items[..index].iter().all(Node::is_null));
        prop_assert_eq!(&items[index], &value);
    }

    #[test]
    fn reapplying_a_successful_changeset_is_unchanged(
        edits in prop::collection::vec(
            (prop::collection::vec(arb_segment(), 1..4), arb_value()),
            1..8,
        )
    ) {
        // A later edit may legitimately replace the parent of an earlier one,
        // which makes the earlier edit conflict on the second pass.
        let leaves: Vec<&(Vec<Segment>, Node)> = edits
            .iter()
            .filter(|(path, _)| !edits.iter().any(|(other, _)| is_proper_prefix(path, other)))
            .collect();

        let changeset = Changeset::from_pairs(
            leaves.iter().map(|(segments, value)| (render(segments), value.clone())),
        )
        .unwrap();

        if let Ok(first) = apply_changeset(&Node::empty_map(), &changeset) {
            let second = apply_changeset(&first.document, &changeset).unwrap();
            prop_assert!(!second.changed);
            prop_assert_eq!(second.document, first.document);
        }
    }
}
