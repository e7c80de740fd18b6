//! Interval-tree store for the folder hierarchy
//!
//! The `folders` table is the authoritative truth; `FolderStore` keeps an
//! in-memory mirror of it (`id → FolderNode` plus derived parent/children
//! links). The mirror is rebuilt in full by `reload()` and patched
//! incrementally from the rows returned by the structural mutations. All
//! three mutations run as single transactions: a failure rolls back and the
//! mirror is never patched from a rolled-back transaction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rusqlite::named_params;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::MailviewError;
use crate::folders::node::{FolderNode, FolderTypeTable};

/// Destination boundary for a subtree move
///
/// A move is expressed against exactly one of the two bounds; the other is
/// implied by the subtree's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTo {
    /// New `left` bound of the moved subtree
    Left(i64),
    /// New `right` bound of the moved subtree
    Right(i64),
}

/// The folder store: single writer of interval bounds
pub struct FolderStore {
    db: Arc<Database>,
    folders: HashMap<i64, FolderNode>,
    roots: Vec<i64>,
    types: FolderTypeTable,
}

impl FolderStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_type_table(db, FolderTypeTable::default())
    }

    pub fn with_type_table(db: Arc<Database>, types: FolderTypeTable) -> Self {
        Self {
            db,
            folders: HashMap::new(),
            roots: Vec::new(),
            types,
        }
    }

    pub fn get(&self, id: i64) -> Option<&FolderNode> {
        self.folders.get(&id)
    }

    /// Root folder ids, left-to-right
    pub fn roots(&self) -> &[i64] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = &FolderNode> {
        self.folders.values()
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn type_table(&self) -> &FolderTypeTable {
        &self.types
    }

    /// Rebuild the entire mirror from the `folders` table
    ///
    /// Rows are scanned in ascending `lft` order while a stack of open
    /// ancestors is maintained: an ancestor stays open until a row's `lft`
    /// passes its `rgt`. One linear pass derives every parent/children link.
    /// Existing nodes are updated in place; rows that disappeared from the
    /// table are dropped from the mirror.
    pub fn reload(&mut self) -> Result<(), MailviewError> {
        let rows: Vec<(i64, String, i64, i64, i64)> = {
            let conn = self.db.connection()?;
            let mut stmt = conn
                .prepare("SELECT id, name, lft, rgt, flags FROM folders ORDER BY lft ASC")?;
            let mapped = stmt.query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?;
            mapped.collect::<Result<_, _>>()?
        };

        self.roots.clear();
        let mut seen = HashSet::with_capacity(rows.len());
        // (id, rgt) of the currently open ancestors
        let mut stack: Vec<(i64, i64)> = Vec::new();

        for (id, name, left, right, flags) in rows {
            seen.insert(id);
            let node = self
                .folders
                .entry(id)
                .or_insert_with(|| FolderNode::new(id, String::new(), 0, 0, 0));
            node.name = name;
            node.left = left;
            node.right = right;
            node.flags = flags;
            node.parent = None;
            node.children.clear();

            while let Some(&(_, open_right)) = stack.last() {
                if open_right < left {
                    stack.pop();
                } else {
                    break;
                }
            }

            if let Some(&(parent_id, _)) = stack.last() {
                if let Some(node) = self.folders.get_mut(&id) {
                    node.parent = Some(parent_id);
                }
                if let Some(parent) = self.folders.get_mut(&parent_id) {
                    parent.children.push(id);
                }
            } else {
                self.roots.push(id);
            }
            stack.push((id, right));
        }

        self.folders.retain(|id, _| seen.contains(id));
        debug!(folders = self.folders.len(), "Reloaded folder mirror");
        Ok(())
    }

    /// Folders whose interval strictly contains `[left, right]`, nearest
    /// ancestor first
    pub fn find_ancestors(&self, left: i64, right: i64) -> Result<Vec<&FolderNode>, MailviewError> {
        let ids = {
            let conn = self.db.connection()?;
            let mut stmt = conn.prepare(
                "SELECT id FROM folders WHERE lft < :lft AND rgt > :rgt ORDER BY lft DESC",
            )?;
            let rows = stmt.query_map(named_params! { ":lft": left, ":rgt": right }, |row| {
                row.get::<_, i64>(0)
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        Ok(ids.iter().filter_map(|id| self.folders.get(id)).collect())
    }

    /// Folders strictly contained within `[left, right]`, in pre-order
    pub fn find_descendants(
        &self,
        left: i64,
        right: i64,
    ) -> Result<Vec<&FolderNode>, MailviewError> {
        let ids = {
            let conn = self.db.connection()?;
            let mut stmt = conn.prepare(
                "SELECT id FROM folders WHERE lft > :lft AND rgt < :rgt ORDER BY lft ASC",
            )?;
            let rows = stmt.query_map(named_params! { ":lft": left, ":rgt": right }, |row| {
                row.get::<_, i64>(0)
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        Ok(ids.iter().filter_map(|id| self.folders.get(id)).collect())
    }

    /// Ancestors of the given folder, nearest first
    pub fn ancestors_of(&self, id: i64) -> Result<Vec<&FolderNode>, MailviewError> {
        let node = self
            .folders
            .get(&id)
            .ok_or(MailviewError::FolderNotFound(id))?;
        self.find_ancestors(node.left, node.right)
    }

    /// Descendants of the given folder, in pre-order
    pub fn descendants_of(&self, id: i64) -> Result<Vec<&FolderNode>, MailviewError> {
        let node = self
            .folders
            .get(&id)
            .ok_or(MailviewError::FolderNotFound(id))?;
        self.find_descendants(node.left, node.right)
    }

    /// Classification of the folder's own flags, `""` if none applies
    pub fn folder_type(&self, id: i64) -> &str {
        self.folders
            .get(&id)
            .map(|node| node.classify(&self.types))
            .unwrap_or("")
    }

    /// The folder's own classification, or the nearest classified ancestor's
    pub fn nearest_type(&self, id: i64) -> &str {
        let mut current = self.folders.get(&id);
        while let Some(node) = current {
            let label = node.classify(&self.types);
            if !label.is_empty() {
                return label;
            }
            current = node.parent.and_then(|parent| self.folders.get(&parent));
        }
        ""
    }

    /// Slash-separated path of the folder; a parentless folder is `"root"`
    pub fn full_name(&self, id: i64) -> Result<String, MailviewError> {
        let node = self
            .folders
            .get(&id)
            .ok_or(MailviewError::FolderNotFound(id))?;
        match node.parent {
            None => Ok("root".to_string()),
            Some(parent) => Ok(format!("{}/{}", self.full_name(parent)?, node.name)),
        }
    }

    /// Move the subtree at `[left, right]` so that its interval lands on the
    /// given destination bound
    ///
    /// Picture the subtree as one block on the number line and everything
    /// between it and the destination as the adjacent block; the move swaps
    /// the two blocks. Every bound inside the adjacent block shifts by the
    /// subtree's size (signed towards the vacated side), every bound of the
    /// subtree shifts by the adjacent block's size. The subtree's rows are
    /// captured by id before any shifting, because the adjacent shift slides
    /// other rows into the old interval.
    ///
    /// Only the mirror's bounds are patched from the returned rows;
    /// parent/children links are left to `insert` or a full `reload`.
    pub fn move_subtree(
        &mut self,
        left: i64,
        right: i64,
        to: MoveTo,
    ) -> Result<(), MailviewError> {
        let child_size = right - left + 1;
        let (adjacent_left, adjacent_right, adjacent_shift, child_shift) = match to {
            MoveTo::Left(new_left) => {
                if new_left >= left && new_left <= right {
                    return Err(MailviewError::InvalidInput(format!(
                        "new left {new_left} is within the moved interval {left}-{right}"
                    )));
                }
                (new_left, left - 1, child_size, new_left - left)
            }
            MoveTo::Right(new_right) => {
                if new_right >= left && new_right <= right {
                    return Err(MailviewError::InvalidInput(format!(
                        "new right {new_right} is within the moved interval {left}-{right}"
                    )));
                }
                (right + 1, new_right, -child_size, new_right - right)
            }
        };

        let mut left_patches: Vec<(i64, i64)> = Vec::new();
        let mut right_patches: Vec<(i64, i64)> = Vec::new();
        let mut child_patches: Vec<(i64, i64, i64)> = Vec::new();

        let conn = self.db.connection()?;
        let tx = conn.unchecked_transaction()?;
        {
            tx.execute(
                "CREATE TEMPORARY TABLE move_scope AS
                 SELECT id FROM folders WHERE lft >= :lft AND rgt <= :rgt",
                named_params! { ":lft": left, ":rgt": right },
            )?;

            let mut stmt = tx.prepare(
                "UPDATE folders SET lft = lft + :shift
                 WHERE lft >= :lo AND lft <= :hi RETURNING id, lft",
            )?;
            let rows = stmt.query_map(
                named_params! {
                    ":shift": adjacent_shift,
                    ":lo": adjacent_left,
                    ":hi": adjacent_right,
                },
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            for row in rows {
                left_patches.push(row?);
            }

            let mut stmt = tx.prepare(
                "UPDATE folders SET rgt = rgt + :shift
                 WHERE rgt >= :lo AND rgt <= :hi RETURNING id, rgt",
            )?;
            let rows = stmt.query_map(
                named_params! {
                    ":shift": adjacent_shift,
                    ":lo": adjacent_left,
                    ":hi": adjacent_right,
                },
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            for row in rows {
                right_patches.push(row?);
            }

            let mut stmt = tx.prepare(
                "UPDATE folders SET lft = lft + :shift, rgt = rgt + :shift
                 WHERE id IN move_scope RETURNING id, lft, rgt",
            )?;
            let rows = stmt.query_map(named_params! { ":shift": child_shift }, |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            for row in rows {
                child_patches.push(row?);
            }

            tx.execute("DROP TABLE move_scope", [])?;
        }
        tx.commit()?;

        // Patch the mirror only after the commit: a rolled-back transaction
        // must leave it untouched.
        for (id, lft) in left_patches {
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.left = lft;
            }
        }
        for (id, rgt) in right_patches {
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.right = rgt;
            }
        }
        for (id, lft, rgt) in child_patches {
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.left = lft;
                folder.right = rgt;
            }
        }

        debug!(left, right, ?to, "Moved folder subtree");
        Ok(())
    }

    /// Create a new leaf folder occupying `[at, at + 1]`
    ///
    /// Opens a two-unit gap by shifting every bound >= `at`, then inserts
    /// the leaf, in one transaction. The new row's id is not surfaced: the
    /// node becomes observable through the full reload this method performs
    /// after the commit.
    pub fn create(&mut self, name: &str, at: i64) -> Result<(), MailviewError> {
        let mut left_patches: Vec<(i64, i64)> = Vec::new();
        let mut right_patches: Vec<(i64, i64)> = Vec::new();

        let conn = self.db.connection()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx
                .prepare("UPDATE folders SET lft = lft + 2 WHERE lft >= :at RETURNING id, lft")?;
            let rows = stmt.query_map(named_params! { ":at": at }, |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            for row in rows {
                left_patches.push(row?);
            }

            let mut stmt = tx
                .prepare("UPDATE folders SET rgt = rgt + 2 WHERE rgt >= :at RETURNING id, rgt")?;
            let rows = stmt.query_map(named_params! { ":at": at }, |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            for row in rows {
                right_patches.push(row?);
            }

            tx.execute(
                "INSERT INTO folders (name, lft, rgt) VALUES (:name, :at, :at + 1)",
                named_params! { ":name": name, ":at": at },
            )?;
        }
        tx.commit()?;
        drop(conn);

        for (id, lft) in left_patches {
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.left = lft;
            }
        }
        for (id, rgt) in right_patches {
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.right = rgt;
            }
        }

        info!(name, at, "Created folder");
        self.reload()
    }

    /// Delete the folder at `[left, right]` and its entire subtree
    ///
    /// Removes every row whose `lft` falls inside the interval and closes
    /// the gap, in one transaction; then reloads to drop the removed nodes
    /// from the mirror.
    pub fn delete(&mut self, left: i64, right: i64) -> Result<(), MailviewError> {
        let size = right - left + 1;
        let mut left_patches: Vec<(i64, i64)> = Vec::new();
        let mut right_patches: Vec<(i64, i64)> = Vec::new();

        let conn = self.db.connection()?;
        let tx = conn.unchecked_transaction()?;
        {
            tx.execute(
                "DELETE FROM folders WHERE lft BETWEEN :lft AND :rgt",
                named_params! { ":lft": left, ":rgt": right },
            )?;

            let mut stmt = tx.prepare(
                "UPDATE folders SET lft = lft - :size WHERE lft > :rgt RETURNING id, lft",
            )?;
            let rows = stmt.query_map(named_params! { ":size": size, ":rgt": right }, |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            for row in rows {
                left_patches.push(row?);
            }

            let mut stmt = tx.prepare(
                "UPDATE folders SET rgt = rgt - :size WHERE rgt > :rgt RETURNING id, rgt",
            )?;
            let rows = stmt.query_map(named_params! { ":size": size, ":rgt": right }, |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            for row in rows {
                right_patches.push(row?);
            }
        }
        tx.commit()?;
        drop(conn);

        for (id, lft) in left_patches {
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.left = lft;
            }
        }
        for (id, rgt) in right_patches {
            if let Some(folder) = self.folders.get_mut(&id) {
                folder.right = rgt;
            }
        }

        info!(left, right, "Deleted folder subtree");
        self.reload()
    }

    /// Reparent `child` under `parent`, optionally in front of one of the
    /// parent's current children
    ///
    /// Delegates the bound changes to `move_subtree`, then splices the
    /// child's parent/children links in place. A move whose destination is
    /// already adjacent to the child is rejected rather than silently
    /// accepted as a no-op.
    pub fn insert(
        &mut self,
        parent: i64,
        child: i64,
        before: Option<i64>,
    ) -> Result<(), MailviewError> {
        let parent_right = self
            .folders
            .get(&parent)
            .ok_or(MailviewError::FolderNotFound(parent))?
            .right;
        let (child_left, child_right) = {
            let node = self
                .folders
                .get(&child)
                .ok_or(MailviewError::FolderNotFound(child))?;
            (node.left, node.right)
        };

        let anchor_left = match before {
            None => None,
            Some(anchor) => {
                let is_child = self
                    .folders
                    .get(&parent)
                    .map(|p| p.children.contains(&anchor))
                    .unwrap_or(false);
                if !is_child {
                    return Err(MailviewError::InvalidInput(format!(
                        "{anchor} is not a child of {parent}"
                    )));
                }
                Some(
                    self.folders
                        .get(&anchor)
                        .ok_or(MailviewError::FolderNotFound(anchor))?
                        .left,
                )
            }
        };

        match anchor_left {
            // Place as last child: the child block ends up just inside the
            // parent's right bound.
            None => {
                if child_left > parent_right {
                    self.move_subtree(child_left, child_right, MoveTo::Left(parent_right))?;
                } else if child_right == parent_right - 1 {
                    return Err(MailviewError::InvalidInput(format!(
                        "folder {child} would not move"
                    )));
                } else {
                    self.move_subtree(child_left, child_right, MoveTo::Right(parent_right - 1))?;
                }
            }
            // Place immediately before the anchor child.
            Some(anchor_left) => {
                if child_left > anchor_left {
                    self.move_subtree(child_left, child_right, MoveTo::Left(anchor_left))?;
                } else if child_right == anchor_left - 1 {
                    return Err(MailviewError::InvalidInput(format!(
                        "folder {child} would not move"
                    )));
                } else {
                    self.move_subtree(child_left, child_right, MoveTo::Right(anchor_left - 1))?;
                }
            }
        }

        // The move keeps every bound correct; splice the links so the mirror
        // needs no reload.
        let old_parent = self.folders.get(&child).and_then(|node| node.parent);
        match old_parent {
            Some(old_parent) => {
                if let Some(node) = self.folders.get_mut(&old_parent) {
                    node.children.retain(|&c| c != child);
                }
            }
            None => self.roots.retain(|&r| r != child),
        }
        if let Some(node) = self.folders.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.folders.get_mut(&parent) {
            match before {
                Some(anchor) => {
                    let at = node
                        .children
                        .iter()
                        .position(|&c| c == anchor)
                        .unwrap_or(node.children.len());
                    node.children.insert(at, child);
                }
                None => node.children.push(child),
            }
        }

        debug!(parent, child, ?before, "Reparented folder");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::node::flags;
    use rusqlite::params;

    fn seed(db: &Database, rows: &[(i64, &str, i64, i64, i64)]) {
        let conn = db.connection().unwrap();
        for (id, name, lft, rgt, folder_flags) in rows {
            conn.execute(
                "INSERT INTO folders (id, name, lft, rgt, flags) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, name, lft, rgt, folder_flags],
            )
            .unwrap();
        }
    }

    // root [1,10] { A [2,5] { A1 [3,4] }, B [6,9] { B1 [7,8] } }
    fn sample_store() -> FolderStore {
        let db = Arc::new(Database::in_memory().unwrap());
        seed(
            &db,
            &[
                (1, "root", 1, 10, 0),
                (2, "A", 2, 5, 0),
                (3, "A1", 3, 4, 0),
                (4, "B", 6, 9, 0),
                (5, "B1", 7, 8, 0),
            ],
        );
        let mut store = FolderStore::new(db);
        store.reload().unwrap();
        store
    }

    fn bounds(store: &FolderStore, id: i64) -> (i64, i64) {
        let node = store.get(id).expect("folder in mirror");
        (node.left, node.right)
    }

    fn assert_interval_invariant(store: &FolderStore) {
        let nodes: Vec<&FolderNode> = store.iter().collect();
        let mut seen_bounds = HashSet::new();
        for node in &nodes {
            assert!(
                node.left < node.right,
                "folder {}: left {} >= right {}",
                node.id,
                node.left,
                node.right
            );
            assert_eq!(
                (node.right - node.left + 1) % 2,
                0,
                "folder {}: odd interval size",
                node.id
            );
            assert!(seen_bounds.insert(node.left), "duplicate bound {}", node.left);
            assert!(
                seen_bounds.insert(node.right),
                "duplicate bound {}",
                node.right
            );
        }
        for a in &nodes {
            for b in &nodes {
                if a.id == b.id {
                    continue;
                }
                let disjoint = a.right < b.left || b.right < a.left;
                let nested = a.is_ancestor_of(b) || a.is_descendant_of(b);
                assert!(
                    disjoint || nested,
                    "folders {} and {} have overlapping intervals",
                    a.id,
                    b.id
                );
            }
        }
    }

    fn shape(store: &FolderStore) -> Vec<(i64, Option<i64>, Vec<i64>, i64, i64)> {
        let mut nodes: Vec<_> = store
            .iter()
            .map(|n| (n.id, n.parent, n.children.clone(), n.left, n.right))
            .collect();
        nodes.sort();
        nodes
    }

    #[test]
    fn test_reload_builds_tree() {
        let store = sample_store();
        assert_eq!(store.len(), 5);
        assert_eq!(store.roots(), &[1]);

        let root = store.get(1).unwrap();
        assert_eq!(root.parent, None);
        assert_eq!(root.children, vec![2, 4]);

        let a = store.get(2).unwrap();
        assert_eq!(a.parent, Some(1));
        assert_eq!(a.children, vec![3]);

        let b1 = store.get(5).unwrap();
        assert_eq!(b1.parent, Some(4));
        assert!(b1.children.is_empty());

        assert_interval_invariant(&store);
    }

    #[test]
    fn test_reload_is_idempotent() {
        let mut store = sample_store();
        let first = shape(&store);
        store.reload().unwrap();
        assert_eq!(first, shape(&store));
    }

    #[test]
    fn test_reload_supports_forests() {
        let db = Arc::new(Database::in_memory().unwrap());
        seed(&db, &[(1, "one", 1, 2, 0), (2, "two", 3, 6, 0), (3, "two/a", 4, 5, 0)]);
        let mut store = FolderStore::new(db);
        store.reload().unwrap();

        assert_eq!(store.roots(), &[1, 2]);
        assert_eq!(store.get(3).unwrap().parent, Some(2));
        assert_interval_invariant(&store);
    }

    #[test]
    fn test_find_ancestors_nearest_first() {
        let store = sample_store();
        let ancestors = store.find_ancestors(3, 4).unwrap();
        let ids: Vec<i64> = ancestors.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);

        // Strict containment: the node itself is not its own ancestor
        let ancestors = store.find_ancestors(2, 5).unwrap();
        let ids: Vec<i64> = ancestors.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1]);

        assert!(store.find_ancestors(1, 10).unwrap().is_empty());
    }

    #[test]
    fn test_find_descendants_preorder() {
        let store = sample_store();
        let descendants = store.find_descendants(1, 10).unwrap();
        let ids: Vec<i64> = descendants.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 5]);

        let descendants = store.find_descendants(2, 5).unwrap();
        let ids: Vec<i64> = descendants.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3]);

        assert!(store.find_descendants(3, 4).unwrap().is_empty());
    }

    #[test]
    fn test_relationship_queries_by_id() {
        let store = sample_store();
        let ids: Vec<i64> = store.ancestors_of(5).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4, 1]);
        let ids: Vec<i64> = store.descendants_of(4).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5]);
        assert!(matches!(
            store.ancestors_of(99),
            Err(MailviewError::FolderNotFound(99))
        ));
    }

    #[test]
    fn test_move_swaps_sibling_blocks() {
        let mut store = sample_store();
        store.move_subtree(2, 5, MoveTo::Right(9)).unwrap();

        assert_eq!(bounds(&store, 1), (1, 10));
        assert_eq!(bounds(&store, 2), (6, 9));
        assert_eq!(bounds(&store, 3), (7, 8));
        assert_eq!(bounds(&store, 4), (2, 5));
        assert_eq!(bounds(&store, 5), (3, 4));
        assert_interval_invariant(&store);

        // The mirror's bounds were patched without a reload; links follow
        // the next reload, which now orders B before A.
        store.reload().unwrap();
        assert_eq!(store.get(1).unwrap().children, vec![4, 2]);
    }

    #[test]
    fn test_move_round_trip_restores_bounds() {
        let mut store = sample_store();
        let before: Vec<(i64, i64, i64)> = {
            let mut v: Vec<_> = store.iter().map(|n| (n.id, n.left, n.right)).collect();
            v.sort();
            v
        };

        store.move_subtree(2, 5, MoveTo::Right(9)).unwrap();
        store.move_subtree(6, 9, MoveTo::Left(2)).unwrap();

        let mut after: Vec<_> = store.iter().map(|n| (n.id, n.left, n.right)).collect();
        after.sort();
        assert_eq!(before, after);
        assert_interval_invariant(&store);
    }

    #[test]
    fn test_move_into_own_interval_is_rejected() {
        let mut store = sample_store();
        let err = store.move_subtree(2, 5, MoveTo::Left(3)).unwrap_err();
        assert!(matches!(err, MailviewError::InvalidInput(_)));
        let err = store.move_subtree(2, 5, MoveTo::Right(5)).unwrap_err();
        assert!(matches!(err, MailviewError::InvalidInput(_)));

        // Nothing changed, in storage or in the mirror
        assert_eq!(bounds(&store, 2), (2, 5));
        store.reload().unwrap();
        assert_eq!(bounds(&store, 2), (2, 5));
    }

    #[test]
    fn test_create_opens_gap_and_materializes_on_reload() {
        let mut store = sample_store();
        store.create("New", 6).unwrap();

        assert_eq!(store.len(), 6);
        assert_eq!(bounds(&store, 1), (1, 12));
        assert_eq!(bounds(&store, 2), (2, 5));
        assert_eq!(bounds(&store, 4), (8, 11));
        assert_eq!(bounds(&store, 5), (9, 10));

        let new = store
            .iter()
            .find(|n| n.name == "New")
            .expect("created folder in mirror after reload");
        assert_eq!((new.left, new.right), (6, 7));
        assert_eq!(new.parent, Some(1));
        assert_eq!(new.flags, 0);
        assert_eq!(store.get(1).unwrap().children, vec![2, new.id, 4]);
        assert_interval_invariant(&store);
    }

    #[test]
    fn test_delete_removes_subtree_and_closes_gap() {
        let mut store = sample_store();
        store.delete(6, 9).unwrap();

        assert_eq!(store.len(), 3);
        assert!(store.get(4).is_none());
        assert!(store.get(5).is_none());
        assert_eq!(bounds(&store, 1), (1, 6));
        assert_eq!(bounds(&store, 2), (2, 5));
        assert_eq!(bounds(&store, 3), (3, 4));
        assert_interval_invariant(&store);
    }

    #[test]
    fn test_insert_as_last_child() {
        let mut store = sample_store();
        // Reparent B under A
        store.insert(2, 4, None).unwrap();

        assert_eq!(bounds(&store, 1), (1, 10));
        assert_eq!(bounds(&store, 2), (2, 9));
        assert_eq!(bounds(&store, 3), (3, 4));
        assert_eq!(bounds(&store, 4), (5, 8));
        assert_eq!(bounds(&store, 5), (6, 7));
        assert_interval_invariant(&store);

        // Links were spliced without a reload
        assert_eq!(store.get(4).unwrap().parent, Some(2));
        assert_eq!(store.get(2).unwrap().children, vec![3, 4]);
        assert_eq!(store.get(1).unwrap().children, vec![2]);

        // The spliced mirror agrees with a full rebuild
        let spliced = shape(&store);
        store.reload().unwrap();
        assert_eq!(spliced, shape(&store));
    }

    #[test]
    fn test_insert_before_sibling() {
        let mut store = sample_store();
        // Move B in front of A
        store.insert(1, 4, Some(2)).unwrap();

        assert_eq!(bounds(&store, 4), (2, 5));
        assert_eq!(bounds(&store, 5), (3, 4));
        assert_eq!(bounds(&store, 2), (6, 9));
        assert_eq!(bounds(&store, 3), (7, 8));
        assert_eq!(store.get(1).unwrap().children, vec![4, 2]);
        assert_interval_invariant(&store);

        let spliced = shape(&store);
        store.reload().unwrap();
        assert_eq!(spliced, shape(&store));
    }

    #[test]
    fn test_insert_folder_from_the_right() {
        let db = Arc::new(Database::in_memory().unwrap());
        seed(&db, &[(1, "one", 1, 2, 0), (2, "two", 3, 6, 0), (3, "two/a", 4, 5, 0)]);
        let mut store = FolderStore::new(db);
        store.reload().unwrap();

        // "two" starts to the right of "one"; adopting it pulls the whole
        // subtree inside
        store.insert(1, 2, None).unwrap();

        assert_eq!(bounds(&store, 1), (1, 6));
        assert_eq!(bounds(&store, 2), (2, 5));
        assert_eq!(bounds(&store, 3), (3, 4));
        assert_eq!(store.roots(), &[1]);
        assert_eq!(store.get(2).unwrap().parent, Some(1));
        assert_interval_invariant(&store);

        let spliced = shape(&store);
        store.reload().unwrap();
        assert_eq!(spliced, shape(&store));
    }

    #[test]
    fn test_insert_noop_is_rejected() {
        let mut store = sample_store();
        // B is already the last child of root
        let err = store.insert(1, 4, None).unwrap_err();
        assert!(matches!(err, MailviewError::InvalidInput(_)));
        // A is already immediately before B
        let err = store.insert(1, 2, Some(4)).unwrap_err();
        assert!(matches!(err, MailviewError::InvalidInput(_)));
        assert_eq!(bounds(&store, 2), (2, 5));
        assert_eq!(bounds(&store, 4), (6, 9));
    }

    #[test]
    fn test_insert_before_requires_current_child() {
        let mut store = sample_store();
        // B1 is a child of B, not of A
        let err = store.insert(2, 4, Some(5)).unwrap_err();
        assert!(matches!(err, MailviewError::InvalidInput(_)));
    }

    #[test]
    fn test_insert_under_own_descendant_is_rejected() {
        let mut store = sample_store();
        let err = store.insert(3, 2, None).unwrap_err();
        assert!(matches!(err, MailviewError::InvalidInput(_)));
    }

    #[test]
    fn test_type_classification() {
        let db = Arc::new(Database::in_memory().unwrap());
        seed(
            &db,
            &[
                (1, "root", 1, 8, 0),
                (2, "Trash", 2, 5, flags::TRASH),
                (3, "2019", 3, 4, 0),
                (4, "Inbox", 6, 7, flags::INBOX),
            ],
        );
        let mut store = FolderStore::new(db);
        store.reload().unwrap();

        assert_eq!(store.folder_type(2), "Trash");
        assert_eq!(store.folder_type(3), "");
        assert_eq!(store.nearest_type(3), "Trash");
        assert_eq!(store.nearest_type(4), "Inbox");
        assert_eq!(store.nearest_type(1), "");
        assert_eq!(store.folder_type(99), "");
    }

    #[test]
    fn test_full_name() {
        let store = sample_store();
        assert_eq!(store.full_name(1).unwrap(), "root");
        assert_eq!(store.full_name(2).unwrap(), "root/A");
        assert_eq!(store.full_name(3).unwrap(), "root/A/A1");
        assert!(matches!(
            store.full_name(99),
            Err(MailviewError::FolderNotFound(99))
        ));
    }
}
