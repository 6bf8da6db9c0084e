//! Structural node tree for PHP sources.
//!
//! Nodes live in an arena owned by the [`Tree`]; back references between
//! nodes are arena keys, so the tree is acyclic in ownership and cheap to
//! share across threads.

mod arena;
mod lines;
mod node;
mod tree;

pub use arena::{Arena, Key};
pub use lines::{Line, Lines};
pub use node::{ArgKey, ClassLike, Function, LineRange, Modifier, Namespace, Node, NodeId, NodeKind};
pub use tree::{Builder, Preorder, Tree, WalkEvent};
