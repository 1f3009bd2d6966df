//! B-tree keyed by the row id.
//!
//! - [`node`] - Page layout and bounds-checked node views
//! - [`tree`] - Search, insert, leaf split and new-root creation
//! - [`Cursor`] - Position within a leaf, used for scans and inserts
//! - [`dump`] - Text rendering of the tree and layout constants

mod cursor;
pub mod dump;
pub mod node;
pub mod tree;

pub use cursor::Cursor;
pub use node::{InternalNode, LeafNode, Node, NodeHeader, NodeHeaderMut, NodeKind};
