//! Search, insertion and leaf splitting.
//!
//! Nodes refer to each other by page number, so every step goes back through
//! the [`Pager`]. Descents are loops capped at [`MAX_DEPTH`] levels.
//!
//! Only leaves split. A leaf that splits while it is the root gets a new
//! internal root above it; internal nodes themselves never split, and an
//! insert that would need one fails with [`Error::TableFull`].

use crate::common::config::TABLE_MAX_PAGES;
use crate::common::PageId;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::storage::Pager;

use super::node::{
    encode_leaf_cell, InternalNode, LeafNode, Node, NodeHeader, NodeHeaderMut, NodeKind,
    LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT,
};

/// Upper bound on tree height. A tree can never be deeper than its page count.
pub const MAX_DEPTH: usize = TABLE_MAX_PAGES;

fn too_deep() -> Error {
    Error::Corrupt(format!("tree deeper than {MAX_DEPTH} levels"))
}

/// Turn `page_id` into an empty root leaf.
pub fn initialize_root(pager: &mut Pager, page_id: PageId) -> Result<()> {
    let mut leaf = LeafNode::new(pager.page_mut(page_id)?.as_mut_slice());
    leaf.initialize();
    leaf.set_root(true);
    Ok(())
}

/// Locate the root page of the table stored in `pager`.
///
/// An empty file gets an empty root leaf on page 0. Otherwise the root is
/// found by following parent pointers up from page 0, which held the
/// first root leaf.
///
/// # Errors
/// Returns `Error::Corrupt` if no page on that path is marked as root.
pub fn find_root(pager: &mut Pager) -> Result<PageId> {
    if pager.num_pages() == 0 {
        initialize_root(pager, PageId::FIRST)?;
        return Ok(PageId::FIRST);
    }

    let mut page_id = PageId::FIRST;
    for _ in 0..MAX_DEPTH {
        let node = Node::new(pager.page(page_id)?.as_slice());
        node.kind()?;
        if node.is_root() {
            return Ok(page_id);
        }
        page_id = node.parent();
    }
    Err(Error::Corrupt("no root page found".into()))
}

/// Find the leaf position where `key` is stored or would be inserted.
///
/// Returns the leaf page and cell index.
pub fn find(pager: &mut Pager, root: PageId, key: u32) -> Result<(PageId, usize)> {
    let mut page_id = root;
    for _ in 0..MAX_DEPTH {
        let page = pager.page(page_id)?.as_slice();
        match Node::new(page).kind()? {
            NodeKind::Leaf => {
                let leaf = LeafNode::new(page);
                leaf.validate()?;
                let cell_num = leaf.search(key).unwrap_or_else(|insert_at| insert_at);
                return Ok((page_id, cell_num));
            }
            NodeKind::Internal => {
                let node = InternalNode::new(page);
                node.validate()?;
                page_id = node.child(node.find_child(key));
            }
        }
    }
    Err(too_deep())
}

/// The leftmost leaf under `root`.
pub fn leftmost_leaf(pager: &mut Pager, root: PageId) -> Result<PageId> {
    let mut page_id = root;
    for _ in 0..MAX_DEPTH {
        let page = pager.page(page_id)?.as_slice();
        match Node::new(page).kind()? {
            NodeKind::Leaf => {
                LeafNode::new(page).validate()?;
                return Ok(page_id);
            }
            NodeKind::Internal => {
                let node = InternalNode::new(page);
                node.validate()?;
                page_id = node.child(0);
            }
        }
    }
    Err(too_deep())
}

/// Largest key stored under `page_id`.
///
/// For a leaf this is its last key. For an internal node it is the max key
/// of its right child, followed down to a leaf.
///
/// # Errors
/// Returns `Error::Corrupt` if the subtree ends in an empty leaf.
pub fn node_max_key(pager: &mut Pager, page_id: PageId) -> Result<u32> {
    let mut page_id = page_id;
    for _ in 0..MAX_DEPTH {
        let page = pager.page(page_id)?.as_slice();
        match Node::new(page).kind()? {
            NodeKind::Leaf => {
                return LeafNode::new(page)
                    .max_key()
                    .ok_or_else(|| Error::Corrupt(format!("{page_id} is an empty leaf")));
            }
            NodeKind::Internal => {
                let node = InternalNode::new(page);
                node.validate()?;
                page_id = node.right_child();
            }
        }
    }
    Err(too_deep())
}

/// Insert `(key, row)` at `cell_num` of leaf `leaf_id`.
///
/// `cell_num` must come from [`find`] on the current tree. `root` is updated
/// when the root leaf splits.
///
/// Nothing is modified when the insert is rejected.
///
/// # Errors
/// - `Error::DuplicateKey` if `key` is already stored at `cell_num`
/// - `Error::TableFull` if a split would need an internal node split or
///   more pages than the table may hold
pub fn insert(
    pager: &mut Pager,
    root: &mut PageId,
    leaf_id: PageId,
    cell_num: usize,
    key: u32,
    row: &Row,
) -> Result<()> {
    let (num_cells, old_max) = {
        let leaf = LeafNode::new(pager.page(leaf_id)?.as_slice());
        leaf.validate()?;
        if cell_num < leaf.num_cells() && leaf.key(cell_num) == key {
            return Err(Error::DuplicateKey(key));
        }
        (leaf.num_cells(), leaf.max_key())
    };

    if num_cells >= LEAF_NODE_MAX_CELLS {
        return split_and_insert(pager, root, leaf_id, cell_num, key, row);
    }

    LeafNode::new(pager.page_mut(leaf_id)?.as_mut_slice()).insert_cell(cell_num, key, row);

    if old_max.is_some_and(|max| key > max) {
        update_ancestor_keys(pager, leaf_id, key)?;
    }
    Ok(())
}

/// Split a full leaf, insert the new cell, and link the new sibling into the tree.
fn split_and_insert(
    pager: &mut Pager,
    root: &mut PageId,
    leaf_id: PageId,
    cell_num: usize,
    key: u32,
    row: &Row,
) -> Result<()> {
    let (is_root, parent_id, mut cells) = {
        let leaf = LeafNode::new(pager.page(leaf_id)?.as_slice());
        let cells: Vec<Vec<u8>> = (0..leaf.num_cells())
            .map(|i| leaf.cell(i).to_vec())
            .collect();
        (leaf.is_root(), leaf.parent(), cells)
    };

    // Everything that can reject the insert is checked before any page changes.
    let pages_needed = if is_root { 2 } else { 1 };
    if pager.free_page_count() < pages_needed {
        tracing::warn!(key, "no free pages left for a leaf split");
        return Err(Error::TableFull);
    }
    if !is_root {
        let parent = InternalNode::new(pager.page(parent_id)?.as_slice());
        parent.validate()?;
        if parent.is_full() {
            tracing::warn!(key, parent = parent_id.0, "parent internal node is full");
            return Err(Error::TableFull);
        }
    }

    cells.insert(cell_num, encode_leaf_cell(key, row).to_vec());
    let (left_cells, right_cells) = cells.split_at(LEAF_NODE_LEFT_SPLIT_COUNT);
    debug_assert_eq!(right_cells.len(), LEAF_NODE_RIGHT_SPLIT_COUNT);

    let right_id = pager.unused_page_id();
    {
        let mut right = LeafNode::new(pager.page_mut(right_id)?.as_mut_slice());
        right.initialize();
        right.set_parent(parent_id);
        for (i, cell) in right_cells.iter().enumerate() {
            right.set_raw_cell(i, cell);
        }
        right.set_num_cells(right_cells.len());
    }
    let (left_max, right_max) = {
        let mut left = LeafNode::new(pager.page_mut(leaf_id)?.as_mut_slice());
        for (i, cell) in left_cells.iter().enumerate() {
            left.set_raw_cell(i, cell);
        }
        left.set_num_cells(left_cells.len());
        let left_max = left.max_key();
        let right_max = LeafNode::new(pager.page(right_id)?.as_slice()).max_key();
        (left_max, right_max)
    };
    let (Some(left_max), Some(right_max)) = (left_max, right_max) else {
        return Err(Error::Corrupt("leaf split produced an empty leaf".into()));
    };

    tracing::debug!(
        leaf = leaf_id.0,
        sibling = right_id.0,
        left_max,
        right_max,
        "split leaf"
    );

    if is_root {
        return create_new_root(pager, root, leaf_id, right_id);
    }

    // The left half now ends at `left_max`.
    update_child_key(pager, parent_id, leaf_id, left_max)?;
    internal_node_insert(pager, parent_id, right_id, right_max)
}

/// Put a new internal root above a root leaf that just split.
///
/// `left_id` keeps its page and becomes the first child; `right_id` is its
/// new sibling.
fn create_new_root(
    pager: &mut Pager,
    root: &mut PageId,
    left_id: PageId,
    right_id: PageId,
) -> Result<()> {
    let left_max = node_max_key(pager, left_id)?;
    let new_root_id = pager.unused_page_id();
    {
        let mut node = InternalNode::new(pager.page_mut(new_root_id)?.as_mut_slice());
        node.initialize();
        node.set_root(true);
        node.insert_cell(0, left_id, left_max);
        node.set_right_child(right_id);
    }
    for child_id in [left_id, right_id] {
        let mut child = Node::new(pager.page_mut(child_id)?.as_mut_slice());
        child.set_root(false);
        child.set_parent(new_root_id);
    }

    tracing::debug!(root = new_root_id.0, left = left_id.0, right = right_id.0, "created new root");
    *root = new_root_id;
    Ok(())
}

/// Add `child_id`, whose subtree ends at `child_max`, to internal node `parent_id`.
///
/// The caller has already checked that the parent has a free cell.
fn internal_node_insert(
    pager: &mut Pager,
    parent_id: PageId,
    child_id: PageId,
    child_max: u32,
) -> Result<()> {
    let right_id = InternalNode::new(pager.page(parent_id)?.as_slice()).right_child();
    let right_max = node_max_key(pager, right_id)?;

    let mut node = InternalNode::new(pager.page_mut(parent_id)?.as_mut_slice());
    if child_max > right_max {
        // The new child holds the largest keys: it takes over as right child.
        let num_keys = node.num_keys();
        node.insert_cell(num_keys, right_id, right_max);
        node.set_right_child(child_id);
        update_ancestor_keys(pager, parent_id, child_max)
    } else {
        let index = node.find_child(child_max);
        node.insert_cell(index, child_id, child_max);
        Ok(())
    }
}

/// Set the cached max key for `child_id` in `parent_id`.
///
/// Returns whether the child has a key cell; the right child does not.
fn update_child_key(
    pager: &mut Pager,
    parent_id: PageId,
    child_id: PageId,
    new_max: u32,
) -> Result<bool> {
    let mut node = InternalNode::new(pager.page_mut(parent_id)?.as_mut_slice());
    let index = node.child_index_of(child_id).ok_or_else(|| {
        Error::Corrupt(format!("{child_id} is not a child of {parent_id}"))
    })?;
    if index < node.num_keys() {
        node.set_key(index, new_max);
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Propagate a new maximum key for `page_id` to the ancestors that cache it.
///
/// Climbs while the node is its parent's right child, since then the parent's
/// own maximum changed too, and stops at the first keyed entry or the root.
fn update_ancestor_keys(pager: &mut Pager, page_id: PageId, new_max: u32) -> Result<()> {
    let mut child_id = page_id;
    for _ in 0..MAX_DEPTH {
        let (is_root, parent_id) = {
            let node = Node::new(pager.page(child_id)?.as_slice());
            (node.is_root(), node.parent())
        };
        if is_root || update_child_key(pager, parent_id, child_id, new_max)? {
            return Ok(());
        }
        child_id = parent_id;
    }
    Err(too_deep())
}
