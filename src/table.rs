//! Table - the single table stored in one database file.
//!
//! A [`Table`] owns the [`Pager`] for its file and the page number of the
//! B-tree root. Rows are keyed by their `id`.

use std::path::Path;

use tracing::{debug, info};

use crate::common::PageId;
use crate::error::{Error, Result};
use crate::index::btree::node::LeafNode;
use crate::index::btree::{dump, tree, Cursor};
use crate::row::Row;
use crate::storage::Pager;

/// Outcome of an insert statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteResult {
    Success,
    DuplicateKey,
    TableFull,
}

/// An open table.
///
/// Dropping the table flushes it the same way [`Table::close`] does, but
/// any error is only logged.
///
/// # Example
/// ```no_run
/// use rowstore::{Row, Table};
///
/// let mut table = Table::open("test.db").unwrap();
/// table.insert(&Row::new(1, "user1", "person1@example.com").unwrap()).unwrap();
/// assert_eq!(table.get(1).unwrap().unwrap().username(), "user1");
/// table.close().unwrap();
/// ```
pub struct Table {
    pub(crate) pager: Pager,
    pub(crate) root_page: PageId,
}

impl Table {
    /// Open the table stored at `path`, creating the file if needed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its length or root
    /// page is invalid.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut pager = Pager::open(path)?;
        let root_page = tree::find_root(&mut pager)?;

        info!(
            path = %path.display(),
            pages = pager.num_pages(),
            root = %root_page,
            "opened table"
        );

        Ok(Self { pager, root_page })
    }

    /// Flush every modified page and sync the file.
    pub fn close(mut self) -> Result<()> {
        self.pager.close()?;
        info!(pages = self.pager.num_pages(), "closed table");
        Ok(())
    }

    /// Page number of the current root node.
    pub fn root_page(&self) -> PageId {
        self.root_page
    }

    /// Direct access to the pager, for inspecting raw pages.
    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    /// Cursor at the first cell of the leftmost leaf.
    pub fn start(&mut self) -> Result<Cursor<'_>> {
        let page_id = tree::leftmost_leaf(&mut self.pager, self.root_page)?;
        let num_cells = LeafNode::new(self.pager.page(page_id)?.as_slice()).num_cells();
        Ok(Cursor::new(self, page_id, 0, num_cells == 0))
    }

    /// Cursor at the position where `key` is stored or would be inserted.
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>> {
        let (page_id, cell_num) = tree::find(&mut self.pager, self.root_page, key)?;
        let num_cells = LeafNode::new(self.pager.page(page_id)?.as_slice()).num_cells();
        Ok(Cursor::new(self, page_id, cell_num, cell_num >= num_cells))
    }

    /// Row stored under `key`, if any.
    pub fn get(&mut self, key: u32) -> Result<Option<Row>> {
        let (page_id, cell_num) = tree::find(&mut self.pager, self.root_page, key)?;
        let leaf = LeafNode::new(self.pager.page(page_id)?.as_slice());
        if cell_num < leaf.num_cells() && leaf.key(cell_num) == key {
            leaf.row(cell_num).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Insert `row` keyed by its id.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if a row with the same id exists
    /// - `Error::TableFull` if the tree cannot grow to hold the row
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        let cursor = self.find(row.id)?;
        cursor.insert(row.id, row)?;
        debug!(id = row.id, root = %self.root_page, "inserted row");
        Ok(())
    }

    /// Insert `row`, reporting duplicate keys and a full table as outcomes
    /// rather than errors.
    pub fn execute_insert(&mut self, row: &Row) -> Result<ExecuteResult> {
        match self.insert(row) {
            Ok(()) => Ok(ExecuteResult::Success),
            Err(Error::DuplicateKey(_)) => Ok(ExecuteResult::DuplicateKey),
            Err(Error::TableFull) => Ok(ExecuteResult::TableFull),
            Err(e) => Err(e),
        }
    }

    /// Rows reachable by scanning from [`Table::start`], in key order.
    ///
    /// The scan stays within one leaf, so after the root splits only the
    /// leftmost leaf's rows are returned. Use [`Table::get`] to reach a row
    /// in any leaf.
    pub fn execute_select(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        let mut cursor = self.start()?;
        while !cursor.end_of_table() {
            rows.push(cursor.value()?);
            cursor.advance()?;
        }
        Ok(rows)
    }

    /// Largest key under `page_id`.
    pub fn node_max_key(&mut self, page_id: PageId) -> Result<u32> {
        tree::node_max_key(&mut self.pager, page_id)
    }

    /// Indented listing of every node from the root down.
    pub fn render_tree(&mut self) -> Result<String> {
        dump::render_tree(&mut self.pager, self.root_page)
    }
}

/// Open the table stored at `path`.
pub fn db_open<P: AsRef<Path>>(path: P) -> Result<Table> {
    Table::open(path)
}

/// Flush and close `table`.
pub fn db_close(table: Table) -> Result<()> {
    table.close()
}

/// Insert `row` into `table`.
pub fn execute_insert(row: &Row, table: &mut Table) -> Result<ExecuteResult> {
    table.execute_insert(row)
}

/// Scan `table` from its first row.
pub fn execute_select(table: &mut Table) -> Result<Vec<Row>> {
    table.execute_select()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(id: u32) -> Row {
        Row::new(id, format!("user{id}"), format!("person{id}@example.com")).unwrap()
    }

    #[test]
    fn test_open_new_table() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        assert_eq!(table.root_page(), PageId::FIRST);
        assert!(table.execute_select().unwrap().is_empty());
        assert_eq!(table.get(1).unwrap(), None);
    }

    #[test]
    fn test_insert_and_get() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        assert_eq!(table.execute_insert(&row(1)).unwrap(), ExecuteResult::Success);
        assert_eq!(table.get(1).unwrap(), Some(row(1)));
        assert_eq!(table.get(2).unwrap(), None);
        assert_eq!(table.get(0).unwrap(), None);
    }

    #[test]
    fn test_execute_insert_duplicate() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();
        table.insert(&row(1)).unwrap();

        let other = Row::new(1, "someone", "else@example.com").unwrap();
        assert_eq!(
            table.execute_insert(&other).unwrap(),
            ExecuteResult::DuplicateKey
        );
        assert_eq!(table.get(1).unwrap(), Some(row(1)));
    }

    #[test]
    fn test_free_functions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut table = db_open(&path).unwrap();
        assert_eq!(execute_insert(&row(4), &mut table).unwrap(), ExecuteResult::Success);
        db_close(table).unwrap();

        let mut table = db_open(&path).unwrap();
        assert_eq!(execute_select(&mut table).unwrap(), vec![row(4)]);
    }

    #[test]
    fn test_node_max_key_of_root() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();
        for id in [5, 9, 2] {
            table.insert(&row(id)).unwrap();
        }

        let root = table.root_page();
        assert_eq!(table.node_max_key(root).unwrap(), 9);
    }
}
