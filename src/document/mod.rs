pub mod node;

pub use node::{ContainerKind, Map, Node, NodeKind, Scalar};
