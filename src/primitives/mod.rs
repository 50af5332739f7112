//! Primitives - What components declare.
//!
//! - [`node`] - The [`Node`] tree and [`create_node`]
//! - [`types`] - Per-kind props, refs and cleanup
//!
//! # Declaring a tree
//!
//! Host nodes are built straight from their props struct; the kind follows
//! from the struct, so a sprite node cannot carry text props.
//!
//! ```ignore
//! Node::host(SpriteProps {
//!     common: CommonProps { x: Some(x), y: Some(y), ..Default::default() },
//!     texture: Some("enemy".into()),
//!     play: Some("enemy-walk".into()),
//!     ..Default::default()
//! })
//! ```
//!
//! Children of plain containers are display children. Children of a
//! [`GroupProps`] node are pool members: the reconciler acquires and releases
//! them instead of creating and destroying them.

mod node;
mod types;

pub use node::{create_node, ComponentType, Node, NodeType, Props, Render};
pub use types::*;
