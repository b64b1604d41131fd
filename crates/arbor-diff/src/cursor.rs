//! Cursors over decoded trees and the order between them.

use std::cmp::Ordering;

use arbor_store::{ObjectKind, ObjectStore, Tree, TreeEntry};
use arbor_types::ObjectId;

use crate::error::{DiffError, DiffResult};

/// Position-tracked view over one tree's entries, in tree order.
///
/// The cursor owns the decoded entries; dropping it releases them.
#[derive(Clone, Debug, Default)]
pub struct TreeCursor {
    entries: Vec<TreeEntry>,
    pos: usize,
}

impl TreeCursor {
    /// A cursor over the empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_tree(tree: Tree) -> Self {
        Self {
            entries: tree.entries,
            pos: 0,
        }
    }

    /// Decode `id` from the store. `None` stands for the empty tree.
    pub fn load(store: &dyn ObjectStore, id: Option<&ObjectId>) -> DiffResult<Self> {
        let Some(id) = id else {
            return Ok(Self::empty());
        };
        let stored = store.read(id)?.ok_or(DiffError::ObjectNotFound(*id))?;
        if stored.kind != ObjectKind::Tree {
            return Err(DiffError::UnexpectedObjectKind {
                id: *id,
                expected: ObjectKind::Tree,
                actual: stored.kind,
            });
        }
        Ok(Self::from_tree(Tree::from_stored_object(&stored)?))
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.entries.len()
    }

    pub fn current(&self) -> Option<&TreeEntry> {
        self.entries.get(self.pos)
    }

    pub fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    /// Skip every remaining entry.
    pub fn exhaust(&mut self) {
        self.pos = self.entries.len();
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.pos)
    }
}

/// Order two cursors by their current entries.
///
/// An exhausted cursor sorts after any entry, so a merge over two cursors
/// drains whichever one still has entries.
pub fn compare_cursors(old: &TreeCursor, new: &TreeCursor) -> Ordering {
    match (old.current(), new.current()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp_path(b),
    }
}
