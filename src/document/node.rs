//! In-memory document tree.
//!
//! A [`Node`] is a map, a sequence or a scalar leaf. Maps keep insertion
//! order so that a document read from disk and written back keeps its key
//! order. Any self-describing format (YAML, JSON, TOML values) deserializes
//! straight into a tree; scalar map keys such as `8080` or `true` are read
//! as their text.
//!
//! # Example
//!
//! ```
//! use doc_patcher::document::{Node, NodeKind};
//!
//! let doc: Node = serde_json::from_str(r#"{"a": [1, "two", null]}"#).unwrap();
//! assert_eq!(doc.kind(), NodeKind::Map);
//! assert_eq!(doc.get("a").unwrap().kind(), NodeKind::Sequence);
//! ```

use crate::keypath::{KeyPath, Segment};
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Map = IndexMap<String, Node>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Map(Map),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

/// Leaf value. Non-negative integers that fit `i64` are always `Integer`;
/// `Unsigned` only holds values above `i64::MAX`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl Scalar {
    fn from_unsigned(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(signed) => Scalar::Integer(signed),
            Err(_) => Scalar::Unsigned(value),
        }
    }
}

// Floats compare by bit pattern so that a document holding NaN still equals
// its own copy.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Unsigned(a), Scalar::Unsigned(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map, sequence or scalar")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Node, D::Error>
    where
        D: Deserializer<'de>,
    {
        Node::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Node, E> {
        Ok(Node::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Node, E> {
        Ok(Node::from(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Node, E> {
        Ok(Node::from(value))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Node, E> {
        Ok(Node::from(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Node, E> {
        Ok(Node::from(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Node, E> {
        Ok(Node::from(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = Map::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(DocumentKey(key)) = access.next_key()? {
            let value = access.next_value()?;
            map.insert(key, value);
        }
        Ok(Node::Map(map))
    }
}

/// Map key read from a document. Scalar keys such as `8080` or `true` are
/// kept in their textual form; collection keys are rejected.
struct DocumentKey(String);

impl<'de> Deserialize<'de> for DocumentKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentKeyVisitor)
    }
}

struct DocumentKeyVisitor;

impl<'de> Visitor<'de> for DocumentKeyVisitor {
    type Value = DocumentKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar map key")
    }

    fn visit_unit<E: de::Error>(self) -> Result<DocumentKey, E> {
        Ok(DocumentKey("null".to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<DocumentKey, E> {
        self.visit_unit()
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<DocumentKey, E> {
        Ok(DocumentKey(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<DocumentKey, E> {
        Ok(DocumentKey(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<DocumentKey, E> {
        Ok(DocumentKey(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<DocumentKey, E> {
        Ok(DocumentKey(value.to_string()))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<DocumentKey, E> {
        Ok(DocumentKey(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<DocumentKey, E> {
        Ok(DocumentKey(value))
    }
}

/// Concrete shape of a node, used when reporting mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Map,
    Sequence,
    Null,
    Bool,
    Integer,
    Float,
    String,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Map => "map",
            NodeKind::Sequence => "sequence",
            NodeKind::Null => "null",
            NodeKind::Bool => "boolean",
            NodeKind::Integer => "integer",
            NodeKind::Float => "float",
            NodeKind::String => "string",
        };
        f.write_str(name)
    }
}

/// The two node shapes a path can walk through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Map,
    Sequence,
}

impl ContainerKind {
    /// Container required by a segment.
    pub fn for_segment(segment: &Segment) -> Self {
        match segment {
            Segment::MapKey(_) => ContainerKind::Map,
            Segment::SequenceIndex(_) => ContainerKind::Sequence,
        }
    }

    /// A fresh, empty container of this kind.
    pub fn empty(self) -> Node {
        match self {
            ContainerKind::Map => Node::Map(Map::new()),
            ContainerKind::Sequence => Node::Sequence(Vec::new()),
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Map => f.write_str("map"),
            ContainerKind::Sequence => f.write_str("sequence"),
        }
    }
}

impl Node {
    pub fn empty_map() -> Self {
        Node::Map(Map::new())
    }

    pub fn empty_sequence() -> Self {
        Node::Sequence(Vec::new())
    }

    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Map(_) => NodeKind::Map,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Scalar(Scalar::Null) => NodeKind::Null,
            Node::Scalar(Scalar::Bool(_)) => NodeKind::Bool,
            Node::Scalar(Scalar::Integer(_) | Scalar::Unsigned(_)) => NodeKind::Integer,
            Node::Scalar(Scalar::Float(_)) => NodeKind::Float,
            Node::Scalar(Scalar::String(_)) => NodeKind::String,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    /// True for a map or sequence with no entries. Scalars are never empty
    /// containers, not even null.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Node::Map(map) => map.is_empty(),
            Node::Sequence(items) => items.is_empty(),
            Node::Scalar(_) => false,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Child of a map by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Read-only lookup along a parsed path. Never creates anything.
    pub fn lookup(&self, path: &KeyPath) -> Option<&Node> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (segment, node) {
                (Segment::MapKey(key), Node::Map(map)) => map.get(key),
                (Segment::SequenceIndex(index), Node::Sequence(items)) => items.get(*index),
                _ => None,
            })
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::empty_map()
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Scalar(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(Scalar::String(value))
    }
}

macro_rules! from_integer {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::Scalar(Scalar::Integer(i64::from(value)))
                }
            }
        )*
    };
}

from_integer! { i8 i16 i32 i64 u8 u16 u32 }

impl From<u64> for Node {
    fn from(value: u64) -> Self {
        Node::Scalar(Scalar::from_unsigned(value))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Sequence(value)
    }
}

impl From<Map> for Node {
    fn from(value: Map) -> Self {
        Node::Map(value)
    }
}

impl FromIterator<(String, Node)> for Node {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        Node::Map(iter.into_iter().collect())
    }
}
