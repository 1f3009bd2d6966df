//! Cursor - a position within a leaf of the table's B-tree.

use crate::common::PageId;
use crate::error::Result;
use crate::row::Row;
use crate::table::Table;

use super::node::LeafNode;
use super::tree;

/// A position `(page, cell)` in one of the table's leaves.
///
/// Cursors come from [`Table::start`] and [`Table::find`] and borrow the
/// table mutably, so no other insert can run while one is alive. An insert
/// through [`Cursor::insert`] consumes the cursor; search again afterwards.
///
/// [`Cursor::advance`] never leaves the current leaf. Once the root has
/// split, a scan from [`Table::start`] covers the leftmost leaf only.
pub struct Cursor<'t> {
    table: &'t mut Table,
    page_id: PageId,
    cell_num: usize,
    end_of_table: bool,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(
        table: &'t mut Table,
        page_id: PageId,
        cell_num: usize,
        end_of_table: bool,
    ) -> Self {
        Self {
            table,
            page_id,
            cell_num,
            end_of_table,
        }
    }

    /// Leaf page the cursor points into.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Cell index within the leaf.
    #[inline]
    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    /// Whether the cursor is past the last cell of its leaf.
    #[inline]
    pub fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    /// Key of the cell under the cursor.
    ///
    /// # Panics
    /// Panics if the cursor is at the end of its leaf.
    pub fn key(&mut self) -> Result<u32> {
        let leaf = LeafNode::new(self.table.pager.page(self.page_id)?.as_slice());
        Ok(leaf.key(self.cell_num))
    }

    /// Row under the cursor.
    ///
    /// # Panics
    /// Panics if the cursor is at the end of its leaf.
    pub fn value(&mut self) -> Result<Row> {
        let leaf = LeafNode::new(self.table.pager.page(self.page_id)?.as_slice());
        leaf.row(self.cell_num)
    }

    /// Move to the next cell of the current leaf.
    pub fn advance(&mut self) -> Result<()> {
        let leaf = LeafNode::new(self.table.pager.page(self.page_id)?.as_slice());
        self.cell_num += 1;
        if self.cell_num >= leaf.num_cells() {
            self.end_of_table = true;
        }
        Ok(())
    }

    /// Insert `(key, row)` at the cursor position.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if the cursor points at `key`
    /// - `Error::TableFull` if the leaf must split and the tree cannot grow
    pub fn insert(self, key: u32, row: &Row) -> Result<()> {
        let table = self.table;
        tree::insert(
            &mut table.pager,
            &mut table.root_page,
            self.page_id,
            self.cell_num,
            key,
            row,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::Table;
    use crate::Row;
    use tempfile::tempdir;

    fn row(id: u32) -> Row {
        Row::new(id, format!("user{id}"), format!("person{id}@example.com")).unwrap()
    }

    #[test]
    fn test_start_on_empty_table() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        let cursor = table.start().unwrap();
        assert!(cursor.end_of_table());
        assert_eq!(cursor.cell_num(), 0);
    }

    #[test]
    fn test_scan_with_cursor() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();
        for id in [2, 1] {
            table.insert(&row(id)).unwrap();
        }

        let mut cursor = table.start().unwrap();
        assert_eq!(cursor.key().unwrap(), 1);
        assert_eq!(cursor.value().unwrap(), row(1));
        cursor.advance().unwrap();
        assert!(!cursor.end_of_table());
        assert_eq!(cursor.value().unwrap(), row(2));
        cursor.advance().unwrap();
        assert!(cursor.end_of_table());
    }

    #[test]
    fn test_insert_through_find_cursor() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();
        table.insert(&row(10)).unwrap();

        let cursor = table.find(5).unwrap();
        assert_eq!(cursor.cell_num(), 0);
        cursor.insert(5, &row(5)).unwrap();

        let cursor = table.find(10).unwrap();
        assert_eq!(cursor.cell_num(), 1);
        assert!(!cursor.end_of_table());
    }
}
