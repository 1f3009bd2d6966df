//! On-disk node layout and bounds-checked views over page buffers.
//!
//! Every node starts with the common header, followed by a kind-specific
//! header and a packed cell array.
//!
//! # Common header (6 bytes)
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       1     node kind (0 = internal, 1 = leaf)
//! 1       1     is_root (0 or 1)
//! 2       4     parent page number (u32, little-endian)
//! ```
//!
//! # Leaf node
//! ```text
//! 6       4     num_cells
//! 10      ...   cells: { key: u32, row: [u8; ROW_SIZE] } × num_cells
//! ```
//!
//! # Internal node
//! ```text
//! 6       4     num_keys
//! 10      4     right child page number
//! 14      ...   cells: { child: u32, key: u32 } × num_keys
//! ```
//!
//! Views are cheap wrappers around a page-sized byte slice. Reads check cell
//! indices against the stored cell count and writes check them against the
//! node's capacity, so layout mistakes panic instead of touching the wrong bytes.

use crate::common::config::{INTERNAL_NODE_MAX_CELLS, PAGE_SIZE};
use crate::common::PageId;
use crate::error::{Error, Result};
use crate::row::{Row, ROW_SIZE};

// Common node header layout
pub const NODE_TYPE_SIZE: usize = std::mem::size_of::<u8>();
pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = std::mem::size_of::<u8>();
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
pub const PARENT_POINTER_SIZE: usize = std::mem::size_of::<u32>();
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

// Leaf node header layout
pub const LEAF_NODE_NUM_CELLS_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE;

// Leaf node body layout
pub const LEAF_NODE_KEY_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_KEY_OFFSET: usize = 0;
pub const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_VALUE_OFFSET: usize = LEAF_NODE_KEY_OFFSET + LEAF_NODE_KEY_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Cells kept by the left (existing) leaf when a full leaf splits.
///
/// The left half takes the extra cell when the total is odd.
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 2) / 2;
/// Cells moved to the new right sibling when a full leaf splits.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = LEAF_NODE_MAX_CELLS + 1 - LEAF_NODE_LEFT_SPLIT_COUNT;

// Internal node header layout
pub const INTERNAL_NODE_NUM_KEYS_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

// Internal node body layout
pub const INTERNAL_NODE_CHILD_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_KEY_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

const _: () = assert!(LEAF_NODE_MAX_CELLS >= 2);
const _: () = assert!(
    INTERNAL_NODE_HEADER_SIZE + INTERNAL_NODE_MAX_CELLS * INTERNAL_NODE_CELL_SIZE <= PAGE_SIZE
);

/// Kind of B-tree node stored in a page.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Internal = 0,
    Leaf = 1,
}

impl NodeKind {
    /// Decode the node kind byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(NodeKind::Internal),
            1 => Some(NodeKind::Leaf),
            _ => None,
        }
    }
}

/// Read the node kind from a page.
///
/// # Errors
/// Returns `Error::Corrupt` for an unknown kind byte.
pub fn node_kind(data: &[u8]) -> Result<NodeKind> {
    let byte = data[NODE_TYPE_OFFSET];
    NodeKind::from_u8(byte).ok_or_else(|| Error::Corrupt(format!("unknown node kind {byte}")))
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Smallest index in `0..len` whose key is `>= target`, or `len` if none.
fn lower_bound(len: usize, target: u32, key_at: impl Fn(usize) -> u32) -> usize {
    let mut start = 0;
    let mut end = len;
    while start < end {
        let mid = (start + end) / 2;
        if key_at(mid) >= target {
            end = mid;
        } else {
            start = mid + 1;
        }
    }
    start
}

fn check_page_len(data: &[u8]) {
    assert_eq!(
        data.len(),
        PAGE_SIZE,
        "node view needs a {PAGE_SIZE}-byte page, got {}",
        data.len()
    );
}

/// Header fields shared by leaf and internal nodes.
pub trait NodeHeader {
    fn bytes(&self) -> &[u8];

    fn is_root(&self) -> bool {
        self.bytes()[IS_ROOT_OFFSET] != 0
    }

    /// Parent page number. Meaningless for the root.
    fn parent(&self) -> PageId {
        PageId::new(read_u32(self.bytes(), PARENT_POINTER_OFFSET))
    }
}

/// Mutable access to the common header.
pub trait NodeHeaderMut: NodeHeader {
    fn bytes_mut(&mut self) -> &mut [u8];

    fn set_root(&mut self, is_root: bool) {
        self.bytes_mut()[IS_ROOT_OFFSET] = u8::from(is_root);
    }

    fn set_parent(&mut self, parent: PageId) {
        write_u32(self.bytes_mut(), PARENT_POINTER_OFFSET, parent.0);
    }
}

/// View of any node's common header, whatever its kind.
pub struct Node<B> {
    data: B,
}

impl<B: AsRef<[u8]>> Node<B> {
    /// Wrap a page buffer.
    ///
    /// # Panics
    /// Panics if `data` is not exactly one page long.
    pub fn new(data: B) -> Self {
        check_page_len(data.as_ref());
        Self { data }
    }

    /// # Errors
    /// Returns `Error::Corrupt` for an unknown kind byte.
    pub fn kind(&self) -> Result<NodeKind> {
        node_kind(self.bytes())
    }
}

impl<B: AsRef<[u8]>> NodeHeader for Node<B> {
    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> NodeHeaderMut for Node<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }
}

// ============================================================================
// Leaf nodes
// ============================================================================

/// View of a page as a leaf node.
pub struct LeafNode<B> {
    data: B,
}

impl<B: AsRef<[u8]>> NodeHeader for LeafNode<B> {
    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> NodeHeaderMut for LeafNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    /// Wrap a page buffer.
    ///
    /// # Panics
    /// Panics if `data` is not exactly one page long.
    pub fn new(data: B) -> Self {
        check_page_len(data.as_ref());
        Self { data }
    }

    pub fn num_cells(&self) -> usize {
        read_u32(self.bytes(), LEAF_NODE_NUM_CELLS_OFFSET) as usize
    }

    /// Check the stored header against the layout.
    ///
    /// # Errors
    /// Returns `Error::Corrupt` if the page is not a leaf or claims more cells
    /// than fit in a page.
    pub fn validate(&self) -> Result<()> {
        if node_kind(self.bytes())? != NodeKind::Leaf {
            return Err(Error::Corrupt("expected a leaf node".into()));
        }
        if self.num_cells() > LEAF_NODE_MAX_CELLS {
            return Err(Error::Corrupt(format!(
                "leaf holds {} cells, more than {}",
                self.num_cells(),
                LEAF_NODE_MAX_CELLS
            )));
        }
        Ok(())
    }

    /// Raw bytes of cell `cell_num` (key followed by the serialized row).
    ///
    /// # Panics
    /// Panics if `cell_num >= num_cells()`.
    pub fn cell(&self, cell_num: usize) -> &[u8] {
        let num_cells = self.num_cells();
        assert!(
            cell_num < num_cells,
            "leaf cell {cell_num} out of bounds ({num_cells} cells)"
        );
        let offset = LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE;
        &self.bytes()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    /// Key of cell `cell_num`.
    ///
    /// # Panics
    /// Panics if `cell_num >= num_cells()`.
    pub fn key(&self, cell_num: usize) -> u32 {
        read_u32(self.cell(cell_num), LEAF_NODE_KEY_OFFSET)
    }

    /// Serialized row of cell `cell_num`.
    ///
    /// # Panics
    /// Panics if `cell_num >= num_cells()`.
    pub fn value(&self, cell_num: usize) -> &[u8] {
        &self.cell(cell_num)[LEAF_NODE_VALUE_OFFSET..]
    }

    /// Deserialized row of cell `cell_num`.
    pub fn row(&self, cell_num: usize) -> Result<Row> {
        Row::from_bytes(self.value(cell_num))
    }

    /// Key of the last cell, or `None` for an empty leaf.
    pub fn max_key(&self) -> Option<u32> {
        self.num_cells().checked_sub(1).map(|last| self.key(last))
    }

    /// Position where `key` is stored or would be inserted.
    ///
    /// Returns `Ok(index)` if the key is present and `Err(index)` with the
    /// insertion point otherwise.
    pub fn search(&self, key: u32) -> std::result::Result<usize, usize> {
        let num_cells = self.num_cells();
        let index = lower_bound(num_cells, key, |i| self.key(i));
        if index < num_cells && self.key(index) == key {
            Ok(index)
        } else {
            Err(index)
        }
    }

    pub fn is_full(&self) -> bool {
        self.num_cells() >= LEAF_NODE_MAX_CELLS
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    /// Reset the header to an empty, non-root leaf.
    pub fn initialize(&mut self) {
        let data = self.bytes_mut();
        data[NODE_TYPE_OFFSET] = NodeKind::Leaf as u8;
        self.set_root(false);
        self.set_parent(PageId::FIRST);
        self.set_num_cells(0);
    }

    /// # Panics
    /// Panics if `num_cells > LEAF_NODE_MAX_CELLS`.
    pub fn set_num_cells(&mut self, num_cells: usize) {
        assert!(
            num_cells <= LEAF_NODE_MAX_CELLS,
            "leaf cell count {num_cells} exceeds capacity {LEAF_NODE_MAX_CELLS}"
        );
        write_u32(self.bytes_mut(), LEAF_NODE_NUM_CELLS_OFFSET, num_cells as u32);
    }

    fn cell_mut(&mut self, cell_num: usize) -> &mut [u8] {
        assert!(
            cell_num < LEAF_NODE_MAX_CELLS,
            "leaf cell {cell_num} out of bounds (capacity {LEAF_NODE_MAX_CELLS})"
        );
        let offset = LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE;
        &mut self.bytes_mut()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    /// Overwrite cell `cell_num` without touching the cell count.
    ///
    /// # Panics
    /// Panics if `cell_num >= LEAF_NODE_MAX_CELLS`.
    pub fn set_cell(&mut self, cell_num: usize, key: u32, row: &Row) {
        let cell = self.cell_mut(cell_num);
        write_u32(cell, LEAF_NODE_KEY_OFFSET, key);
        row.write_to(&mut cell[LEAF_NODE_VALUE_OFFSET..]);
    }

    /// Overwrite cell `cell_num` with raw cell bytes.
    ///
    /// # Panics
    /// Panics if `cell_num >= LEAF_NODE_MAX_CELLS` or `cell` is not one cell long.
    pub fn set_raw_cell(&mut self, cell_num: usize, cell: &[u8]) {
        self.cell_mut(cell_num).copy_from_slice(cell);
    }

    /// Insert a cell at `cell_num`, shifting later cells one slot right.
    ///
    /// # Panics
    /// Panics if the leaf is full or `cell_num > num_cells()`.
    pub fn insert_cell(&mut self, cell_num: usize, key: u32, row: &Row) {
        let num_cells = self.num_cells();
        assert!(num_cells < LEAF_NODE_MAX_CELLS, "insert into a full leaf");
        assert!(
            cell_num <= num_cells,
            "leaf insert position {cell_num} past end ({num_cells} cells)"
        );

        let start = LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE;
        let end = LEAF_NODE_HEADER_SIZE + num_cells * LEAF_NODE_CELL_SIZE;
        self.bytes_mut()
            .copy_within(start..end, start + LEAF_NODE_CELL_SIZE);

        self.set_cell(cell_num, key, row);
        self.set_num_cells(num_cells + 1);
    }
}

/// Encode a `(key, row)` pair as raw leaf cell bytes.
pub fn encode_leaf_cell(key: u32, row: &Row) -> [u8; LEAF_NODE_CELL_SIZE] {
    let mut cell = [0u8; LEAF_NODE_CELL_SIZE];
    write_u32(&mut cell, LEAF_NODE_KEY_OFFSET, key);
    row.write_to(&mut cell[LEAF_NODE_VALUE_OFFSET..]);
    cell
}

// ============================================================================
// Internal nodes
// ============================================================================

/// View of a page as an internal node.
///
/// Child `i` for `i < num_keys` lives in cell `i` next to the maximum key of
/// its subtree. Child `num_keys` is the right child, which has no key.
pub struct InternalNode<B> {
    data: B,
}

impl<B: AsRef<[u8]>> NodeHeader for InternalNode<B> {
    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> NodeHeaderMut for InternalNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }
}

impl<B: AsRef<[u8]>> InternalNode<B> {
    /// Wrap a page buffer.
    ///
    /// # Panics
    /// Panics if `data` is not exactly one page long.
    pub fn new(data: B) -> Self {
        check_page_len(data.as_ref());
        Self { data }
    }

    pub fn num_keys(&self) -> usize {
        read_u32(self.bytes(), INTERNAL_NODE_NUM_KEYS_OFFSET) as usize
    }

    pub fn right_child(&self) -> PageId {
        PageId::new(read_u32(self.bytes(), INTERNAL_NODE_RIGHT_CHILD_OFFSET))
    }

    /// # Errors
    /// Returns `Error::Corrupt` if the page is not an internal node or claims
    /// more keys than [`INTERNAL_NODE_MAX_CELLS`].
    pub fn validate(&self) -> Result<()> {
        if node_kind(self.bytes())? != NodeKind::Internal {
            return Err(Error::Corrupt("expected an internal node".into()));
        }
        if self.num_keys() > INTERNAL_NODE_MAX_CELLS {
            return Err(Error::Corrupt(format!(
                "internal node holds {} keys, more than {}",
                self.num_keys(),
                INTERNAL_NODE_MAX_CELLS
            )));
        }
        Ok(())
    }

    fn cell_offset(&self, cell_num: usize) -> usize {
        let num_keys = self.num_keys();
        assert!(
            cell_num < num_keys,
            "internal cell {cell_num} out of bounds ({num_keys} keys)"
        );
        INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
    }

    /// Page number of child `child_num`, where `num_keys()` means the right child.
    ///
    /// # Panics
    /// Panics if `child_num > num_keys()`.
    pub fn child(&self, child_num: usize) -> PageId {
        if child_num == self.num_keys() {
            self.right_child()
        } else {
            PageId::new(read_u32(self.bytes(), self.cell_offset(child_num)))
        }
    }

    /// Maximum key under child `key_num`.
    ///
    /// # Panics
    /// Panics if `key_num >= num_keys()`.
    pub fn key(&self, key_num: usize) -> u32 {
        read_u32(
            self.bytes(),
            self.cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE,
        )
    }

    /// Index of the child whose subtree covers `key`.
    ///
    /// Picks the first cell whose max key is `>= key`, or the right child
    /// when `key` is larger than every stored key.
    pub fn find_child(&self, key: u32) -> usize {
        lower_bound(self.num_keys(), key, |i| self.key(i))
    }

    /// Index of `page` among this node's children.
    pub fn child_index_of(&self, page: PageId) -> Option<usize> {
        (0..=self.num_keys()).find(|&i| self.child(i) == page)
    }

    pub fn is_full(&self) -> bool {
        self.num_keys() >= INTERNAL_NODE_MAX_CELLS
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InternalNode<B> {
    /// Reset the header to an empty, non-root internal node.
    pub fn initialize(&mut self) {
        let data = self.bytes_mut();
        data[NODE_TYPE_OFFSET] = NodeKind::Internal as u8;
        self.set_root(false);
        self.set_parent(PageId::FIRST);
        self.set_num_keys(0);
        self.set_right_child(PageId::FIRST);
    }

    /// # Panics
    /// Panics if `num_keys > INTERNAL_NODE_MAX_CELLS`.
    pub fn set_num_keys(&mut self, num_keys: usize) {
        assert!(
            num_keys <= INTERNAL_NODE_MAX_CELLS,
            "internal key count {num_keys} exceeds capacity {INTERNAL_NODE_MAX_CELLS}"
        );
        write_u32(self.bytes_mut(), INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys as u32);
    }

    pub fn set_right_child(&mut self, child: PageId) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_RIGHT_CHILD_OFFSET, child.0);
    }

    /// Overwrite the key of cell `key_num`.
    ///
    /// # Panics
    /// Panics if `key_num >= num_keys()`.
    pub fn set_key(&mut self, key_num: usize, key: u32) {
        let offset = self.cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE;
        write_u32(self.bytes_mut(), offset, key);
    }

    /// Insert a `(child, key)` cell at `cell_num`, shifting later cells right.
    ///
    /// # Panics
    /// Panics if the node is full or `cell_num > num_keys()`.
    pub fn insert_cell(&mut self, cell_num: usize, child: PageId, key: u32) {
        let num_keys = self.num_keys();
        assert!(num_keys < INTERNAL_NODE_MAX_CELLS, "insert into a full internal node");
        assert!(
            cell_num <= num_keys,
            "internal insert position {cell_num} past end ({num_keys} keys)"
        );

        let start = INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE;
        let end = INTERNAL_NODE_HEADER_SIZE + num_keys * INTERNAL_NODE_CELL_SIZE;
        let data = self.bytes_mut();
        data.copy_within(start..end, start + INTERNAL_NODE_CELL_SIZE);
        write_u32(data, start, child.0);
        write_u32(data, start + INTERNAL_NODE_CHILD_SIZE, key);

        self.set_num_keys(num_keys + 1);
    }
}
