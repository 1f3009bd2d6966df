//! Integration tests for the table and its B-tree.
//!
//! These drive the public API end to end, including reopening files.

use rowstore::index::btree::node::{InternalNode, LeafNode, Node, NodeHeader, NodeKind};
use rowstore::{Error, ExecuteResult, PageId, Row, Table, PAGE_SIZE};
use tempfile::tempdir;

fn create_table() -> (Table, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let table = Table::open(dir.path().join("test.db")).unwrap();
    (table, dir)
}

fn row(id: u32) -> Row {
    Row::new(id, format!("user{id}"), format!("person{id}@example.com")).unwrap()
}

fn leaf_keys(table: &mut Table, page_id: PageId) -> Vec<u32> {
    let leaf = LeafNode::new(table.pager_mut().page(page_id).unwrap().as_slice());
    (0..leaf.num_cells()).map(|i| leaf.key(i)).collect()
}

/// Rows inserted out of order come back sorted.
#[test]
fn test_select_returns_sorted_rows() {
    let (mut table, _dir) = create_table();
    for id in [3, 1, 2] {
        assert_eq!(table.execute_insert(&row(id)).unwrap(), ExecuteResult::Success);
    }

    let rows = table.execute_select().unwrap();
    assert_eq!(rows, vec![row(1), row(2), row(3)]);
}

/// The 14th row splits the root leaf into two leaves under a new internal root.
#[test]
fn test_root_split_builds_two_level_tree() {
    let (mut table, _dir) = create_table();
    for id in 1..=14 {
        table.insert(&row(id)).unwrap();
    }

    let root = table.root_page();
    assert_ne!(root, PageId::FIRST);

    let (left, right) = {
        let page = table.pager_mut().page(root).unwrap().as_slice();
        assert_eq!(Node::new(page).kind().unwrap(), NodeKind::Internal);
        let node = InternalNode::new(page);
        assert!(node.is_root());
        assert_eq!(node.num_keys(), 1);
        assert_eq!(node.key(0), 7);
        (node.child(0), node.right_child())
    };

    let mut keys = leaf_keys(&mut table, left);
    keys.extend(leaf_keys(&mut table, right));
    assert_eq!(keys, (1..=14).collect::<Vec<_>>());

    for child in [left, right] {
        let page = table.pager_mut().page(child).unwrap().as_slice();
        let node = Node::new(page);
        assert!(!node.is_root());
        assert_eq!(node.parent(), root);
    }

    // A scan stays in the leftmost leaf; lookups reach both.
    assert_eq!(table.execute_select().unwrap(), (1..=7).map(row).collect::<Vec<_>>());
    assert_eq!(table.get(14).unwrap(), Some(row(14)));
}

/// Once the root internal node is full, a leaf split is refused and nothing changes.
#[test]
fn test_table_full_leaves_table_unchanged() {
    let (mut table, _dir) = create_table();
    for id in 1..=34 {
        assert_eq!(table.execute_insert(&row(id)).unwrap(), ExecuteResult::Success);
    }

    let pages_before = table.pager_mut().num_pages();
    let root_before = table.root_page();
    let scan_before = table.execute_select().unwrap();

    assert_eq!(table.execute_insert(&row(35)).unwrap(), ExecuteResult::TableFull);
    assert!(matches!(table.insert(&row(35)), Err(Error::TableFull)));

    assert_eq!(table.pager_mut().num_pages(), pages_before);
    assert_eq!(table.root_page(), root_before);
    assert_eq!(table.execute_select().unwrap(), scan_before);
    assert_eq!(table.get(35).unwrap(), None);
    for id in 1..=34 {
        assert_eq!(table.get(id).unwrap(), Some(row(id)));
    }
}

/// A leaf header claiming more cells than fit is reported by scans, not a panic.
#[test]
fn test_scan_rejects_oversized_leaf() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let mut page = [0u8; PAGE_SIZE];
    page[0] = NodeKind::Leaf as u8;
    page[1] = 1;
    page[6..10].copy_from_slice(&20u32.to_le_bytes());
    std::fs::write(&path, page).unwrap();

    let mut table = Table::open(&path).unwrap();
    assert!(matches!(table.execute_select(), Err(Error::Corrupt(_))));
    assert!(matches!(table.start(), Err(Error::Corrupt(_))));
    assert!(matches!(table.get(1), Err(Error::Corrupt(_))));
}

/// A duplicate id is rejected and the stored row keeps its values.
#[test]
fn test_duplicate_key_keeps_stored_row() {
    let (mut table, _dir) = create_table();
    table.insert(&row(1)).unwrap();

    let other = Row::new(1, "intruder", "intruder@example.com").unwrap();
    assert_eq!(table.execute_insert(&other).unwrap(), ExecuteResult::DuplicateKey);
    assert!(matches!(table.insert(&other), Err(Error::DuplicateKey(1))));

    assert_eq!(table.get(1).unwrap(), Some(row(1)));
    assert_eq!(table.execute_select().unwrap(), vec![row(1)]);
}

/// Duplicates are also caught in a leaf below an internal root.
#[test]
fn test_duplicate_key_after_split() {
    let (mut table, _dir) = create_table();
    for id in 1..=20 {
        table.insert(&row(id)).unwrap();
    }

    for id in [1, 7, 8, 20] {
        assert_eq!(table.execute_insert(&row(id)).unwrap(), ExecuteResult::DuplicateKey);
    }
}

/// Rows survive closing and reopening the file.
#[test]
fn test_persistence_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    {
        let mut table = Table::open(&path).unwrap();
        table.insert(&row(1)).unwrap();
        table.insert(&row(2)).unwrap();
        table.close().unwrap();
    }

    let metadata = std::fs::metadata(&path).unwrap();
    assert_eq!(metadata.len(), PAGE_SIZE as u64);

    let mut table = Table::open(&path).unwrap();
    assert_eq!(table.execute_select().unwrap(), vec![row(1), row(2)]);
}

/// The relocated root is found again after reopening a split tree.
#[test]
fn test_persistence_after_split() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let root = {
        let mut table = Table::open(&path).unwrap();
        for id in (1..=30).rev() {
            table.insert(&row(id)).unwrap();
        }
        let root = table.root_page();
        table.close().unwrap();
        root
    };

    let mut table = Table::open(&path).unwrap();
    assert_eq!(table.root_page(), root);
    for id in 1..=30 {
        assert_eq!(table.get(id).unwrap(), Some(row(id)));
    }
    assert_eq!(table.get(31).unwrap(), None);

    // Inserting after reopen keeps working.
    assert_eq!(table.execute_insert(&row(31)).unwrap(), ExecuteResult::Success);
    assert_eq!(table.get(31).unwrap(), Some(row(31)));
}

/// Dropping a table without closing it still writes its pages.
#[test]
fn test_drop_flushes_pages() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    {
        let mut table = Table::open(&path).unwrap();
        table.insert(&row(9)).unwrap();
    }

    let mut table = Table::open(&path).unwrap();
    assert_eq!(table.get(9).unwrap(), Some(row(9)));
}

/// Every internal key equals the max key of the subtree it points to.
#[test]
fn test_internal_keys_track_subtree_max() {
    let (mut table, _dir) = create_table();
    // Mixed order exercises splits of both the left and right leaves.
    let ids: Vec<u32> = (1..=34).map(|i| (i * 17) % 35).collect();
    for &id in &ids {
        table.insert(&row(id)).unwrap();
    }

    let root = table.root_page();
    let (entries, right_child) = {
        let node = InternalNode::new(table.pager_mut().page(root).unwrap().as_slice());
        let entries: Vec<(PageId, u32)> =
            (0..node.num_keys()).map(|i| (node.child(i), node.key(i))).collect();
        (entries, node.right_child())
    };

    let mut previous = None;
    for (child, key) in entries {
        assert_eq!(table.node_max_key(child).unwrap(), key);
        assert!(previous.map_or(true, |p| p < key));
        previous = Some(key);
    }
    assert_eq!(table.node_max_key(root).unwrap(), 34);
    assert_eq!(table.node_max_key(right_child).unwrap(), 34);

    for &id in &ids {
        assert_eq!(table.get(id).unwrap(), Some(row(id)));
    }
}

/// The tree listing shows the node structure after a split.
#[test]
fn test_render_tree_after_split() {
    let (mut table, _dir) = create_table();
    for id in 1..=14 {
        table.insert(&row(id)).unwrap();
    }

    let tree = table.render_tree().unwrap();
    assert!(tree.starts_with("- internal (size 1)\n  - leaf (size 7)\n    - 1\n"));
    assert!(tree.contains("  - key 7\n  - leaf (size 7)\n    - 8\n"));
    assert!(tree.ends_with("    - 14\n"));
}
