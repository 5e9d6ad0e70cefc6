//! End-to-end behaviour of the path parser and structural patcher through
//! the public API.

use doc_patcher::{
    apply_changeset, apply_changeset_in_place, Changeset, ContainerKind, KeyPath, Node, NodeKind,
    PatchError, Segment,
};

fn json(text: &str) -> Node {
    serde_json::from_str(text).expect("valid json fixture")
}

fn yaml(text: &str) -> Node {
    serde_yaml::from_str(text).expect("valid yaml fixture")
}

#[test]
fn vllm_arguments_from_empty_document() {
    let changeset = Changeset::from_pairs([
        ("serve.vllm.vllm_args[0]", "--tensor-parallel-size"),
        ("serve.vllm.vllm_args[1]", "5"),
    ])
    .unwrap();

    let outcome = apply_changeset(&Node::empty_map(), &changeset).unwrap();

    assert!(outcome.changed);
    assert_eq!(
        outcome.document,
        json(r#"{"serve": {"vllm": {"vllm_args": ["--tensor-parallel-size", "5"]}}}"#)
    );
}

#[test]
fn second_application_reports_unchanged() {
    let original = yaml(
        r#"
serve:
  vllm:
    model: llama
    vllm_args:
      - --port
      - "8000"
"#,
    );
    let changeset = Changeset::from_pairs([
        ("serve.vllm.vllm_args[2]", Node::from("--api-key")),
        ("serve.vllm.replicas", Node::from(2)),
        ("labels[\"app.kubernetes.io/name\"]", Node::from("vllm")),
    ])
    .unwrap();

    let first = apply_changeset(&original, &changeset).unwrap();
    assert!(first.changed);

    let second = apply_changeset(&first.document, &changeset).unwrap();
    assert!(!second.changed);
    assert_eq!(second.document, first.document);
}

#[test]
fn parser_literal_cases() {
    assert_eq!(
        KeyPath::parse("a.b.c").unwrap().segments(),
        &[Segment::key("a"), Segment::key("b"), Segment::key("c")]
    );
    assert_eq!(
        KeyPath::parse("list[0]").unwrap().segments(),
        &[Segment::key("list"), Segment::index(0)]
    );
    assert_eq!(
        KeyPath::parse("a.b[\"x.y\"]").unwrap().segments(),
        &[Segment::key("a"), Segment::key("b"), Segment::key("x.y")]
    );
}

#[test]
fn index_past_end_pads_with_nulls() {
    let changeset = Changeset::from_pairs([("arr[2]", "third")]).unwrap();
    let outcome = apply_changeset(&Node::empty_map(), &changeset).unwrap();

    let arr = outcome.document.get("arr").and_then(Node::as_sequence).unwrap();
    assert_eq!(arr.len(), 3);
    assert!(arr[0].is_null());
    assert!(arr[1].is_null());
    assert_eq!(arr[2], Node::from("third"));
}

#[test]
fn empty_containers_coerce_both_ways() {
    let to_sequence = Changeset::from_pairs([("[0]", "first")]).unwrap();
    let outcome = apply_changeset(&Node::empty_map(), &to_sequence).unwrap();
    assert_eq!(outcome.document, json(r#"["first"]"#));

    let to_map = Changeset::from_pairs([("x", 1)]).unwrap();
    let outcome = apply_changeset(&Node::empty_sequence(), &to_map).unwrap();
    assert_eq!(outcome.document, json(r#"{"x": 1}"#));
}

#[test]
fn conflict_commits_nothing() {
    let original = json(r#"[1, 2, 3]"#);
    let changeset = Changeset::from_pairs([("x", 1)]).unwrap();

    let err = apply_changeset(&original, &changeset).unwrap_err();
    assert_eq!(
        err,
        PatchError::TypeConflict {
            path: "x".to_string(),
            segment: Segment::key("x"),
            expected: ContainerKind::Map,
            found: NodeKind::Sequence,
        }
    );
    assert_eq!(original, json(r#"[1, 2, 3]"#));

    let mut in_place = original.clone();
    assert!(apply_changeset_in_place(&mut in_place, &changeset).is_err());
    assert_eq!(in_place, original);
}

#[test]
fn conflict_after_successful_edits_is_all_or_nothing() {
    let original = json(r#"{"name": "svc", "ports": [80]}"#);
    let changeset = Changeset::from_pairs([
        ("name", Node::from("renamed")),
        ("extra.deep.key", Node::from(true)),
        ("ports.http", Node::from(8080)),
    ])
    .unwrap();

    let err = apply_changeset(&original, &changeset).unwrap_err();
    assert_eq!(err.path_expression(), "ports.http");
    assert_eq!(original, json(r#"{"name": "svc", "ports": [80]}"#));
}

#[test]
fn changed_flag_accuracy() {
    let original = json(r#"{"a": 1}"#);

    let same = Changeset::from_pairs([("a", 1)]).unwrap();
    assert!(!apply_changeset(&original, &same).unwrap().changed);

    let different = Changeset::from_pairs([("a", 2)]).unwrap();
    let outcome = apply_changeset(&original, &different).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.document, json(r#"{"a": 2}"#));
}

#[test]
fn type_change_of_equal_looking_value_is_a_change() {
    let original = json(r#"{"port": 8080}"#);
    let changeset = Changeset::from_pairs([("port", "8080")]).unwrap();
    let outcome = apply_changeset(&original, &changeset).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.document, json(r#"{"port": "8080"}"#));
}

#[test]
fn structured_values_replace_subtrees() {
    let original = json(r#"{"tls": {"enabled": false, "cert": "old.pem"}}"#);
    let replacement = json(r#"{"enabled": true}"#);
    let changeset = Changeset::from_pairs([("tls", replacement.clone())]).unwrap();

    let outcome = apply_changeset(&original, &changeset).unwrap();
    assert_eq!(outcome.document.get("tls"), Some(&replacement));
}
