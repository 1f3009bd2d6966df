//! Text rendering of the tree structure and the node layout constants.

use crate::common::PageId;
use crate::error::{Error, Result};
use crate::row::ROW_SIZE;
use crate::storage::Pager;

use super::node::{
    InternalNode, LeafNode, Node, NodeKind, COMMON_NODE_HEADER_SIZE, LEAF_NODE_CELL_SIZE,
    LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS, LEAF_NODE_SPACE_FOR_CELLS,
};
use super::tree::MAX_DEPTH;

/// Render the subtree rooted at `root`.
///
/// ```text
/// - internal (size 1)
///   - leaf (size 7)
///     - 1
///     ...
///   - key 7
///   - leaf (size 7)
///     - 8
///     ...
/// ```
pub fn render_tree(pager: &mut Pager, root: PageId) -> Result<String> {
    let mut out = String::new();
    render_node(pager, root, 0, &mut out)?;
    Ok(out)
}

fn render_node(pager: &mut Pager, page_id: PageId, level: usize, out: &mut String) -> Result<()> {
    if level >= MAX_DEPTH {
        return Err(Error::Corrupt(format!("tree deeper than {MAX_DEPTH} levels")));
    }
    let indent = "  ".repeat(level);
    let child_indent = "  ".repeat(level + 1);

    let page = pager.page(page_id)?.as_slice();
    match Node::new(page).kind()? {
        NodeKind::Leaf => {
            let leaf = LeafNode::new(page);
            leaf.validate()?;
            out.push_str(&format!("{indent}- leaf (size {})\n", leaf.num_cells()));
            for i in 0..leaf.num_cells() {
                out.push_str(&format!("{child_indent}- {}\n", leaf.key(i)));
            }
        }
        NodeKind::Internal => {
            let node = InternalNode::new(page);
            node.validate()?;
            let num_keys = node.num_keys();
            out.push_str(&format!("{indent}- internal (size {num_keys})\n"));
            let entries: Vec<(PageId, u32)> =
                (0..num_keys).map(|i| (node.child(i), node.key(i))).collect();
            let right_child = node.right_child();

            for (child, key) in entries {
                render_node(pager, child, level + 1, out)?;
                out.push_str(&format!("{child_indent}- key {key}\n"));
            }
            render_node(pager, right_child, level + 1, out)?;
        }
    }
    Ok(())
}

/// The node layout constants, one `NAME: value` per line.
pub fn render_constants() -> String {
    [
        ("ROW_SIZE", ROW_SIZE),
        ("COMMON_NODE_HEADER_SIZE", COMMON_NODE_HEADER_SIZE),
        ("LEAF_NODE_HEADER_SIZE", LEAF_NODE_HEADER_SIZE),
        ("LEAF_NODE_CELL_SIZE", LEAF_NODE_CELL_SIZE),
        ("LEAF_NODE_SPACE_FOR_CELLS", LEAF_NODE_SPACE_FOR_CELLS),
        ("LEAF_NODE_MAX_CELLS", LEAF_NODE_MAX_CELLS),
    ]
    .iter()
    .map(|(name, value)| format!("{name}: {value}\n"))
    .collect()
}
