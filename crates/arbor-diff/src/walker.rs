//! The merge-join over two trees.
//!
//! [`TreeWalker::walk`] decodes both trees into cursors and advances them
//! in lockstep, in tree order. Entries present on one side only are
//! reported as added or removed; entries present on both sides are reported
//! when their id or mode differs. Matching directories are descended into
//! when recursion is on, with the current path prefix kept in a single
//! `String` that every level appends to and truncates back on return.

use std::cmp::Ordering;

use arbor_store::{ObjectStore, TreeEntry};
use arbor_types::ObjectId;
use tracing::{debug, trace};

use crate::cursor::{compare_cursors, TreeCursor};
use crate::error::DiffResult;
use crate::options::{DiffOptions, DiffStats};
use crate::pathspec::skip_uninteresting;
use crate::queue::{DiffFile, DiffQueue, FilePair};
use crate::sink::{DiffSink, Sign};

/// State of one diff invocation: where events go and what was found.
pub(crate) struct TreeWalker<'a> {
    store: &'a dyn ObjectStore,
    options: &'a DiffOptions,
    sink: &'a mut dyn DiffSink,
    queue: DiffQueue,
    stats: DiffStats,
}

impl<'a> TreeWalker<'a> {
    pub(crate) fn new(
        store: &'a dyn ObjectStore,
        options: &'a DiffOptions,
        sink: &'a mut dyn DiffSink,
    ) -> Self {
        Self {
            store,
            options,
            sink,
            queue: DiffQueue::new(),
            stats: DiffStats::default(),
        }
    }

    /// Compare the trees `old` and `new` (absent = empty tree) found at
    /// `base`, which is empty or ends in `/`.
    pub(crate) fn walk(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        base: &mut String,
    ) -> DiffResult<()> {
        let mut t1 = TreeCursor::load(self.store, old)?;
        let mut t2 = TreeCursor::load(self.store, new)?;
        let filtered = !self.options.pathspec.is_empty();

        loop {
            if self.options.can_quit_early(&self.stats) {
                debug!(base = %base, emitted = self.stats.total(), "quitting tree diff early");
                break;
            }
            if filtered {
                skip_uninteresting(&mut t1, base, &self.options.pathspec);
                skip_uninteresting(&mut t2, base, &self.options.pathspec);
            }
            if t1.at_end() && t2.at_end() {
                break;
            }

            match compare_cursors(&t1, &t2) {
                Ordering::Equal => {
                    if let (Some(e1), Some(e2)) = (t1.current(), t2.current()) {
                        if self.options.find_copies_harder
                            || e1.object_id != e2.object_id
                            || e1.mode != e2.mode
                        {
                            self.show_path(Some(e1), Some(e2), base)?;
                        }
                    }
                    t1.advance();
                    t2.advance();
                }
                Ordering::Less => {
                    self.show_path(t1.current(), None, base)?;
                    t1.advance();
                }
                Ordering::Greater => {
                    self.show_path(None, t2.current(), base)?;
                    t2.advance();
                }
            }
        }
        Ok(())
    }

    /// Report one path and descend into it if it is a directory.
    ///
    /// `base` is restored to its original length before returning, on
    /// failure as well.
    fn show_path(
        &mut self,
        old: Option<&TreeEntry>,
        new: Option<&TreeEntry>,
        base: &mut String,
    ) -> DiffResult<()> {
        let Some(entry) = new.or(old) else {
            panic!("BUG: show_path called without an old or a new entry");
        };

        let (recurse, emit_this) = if self.options.recursive && entry.mode.is_dir() {
            (true, self.options.tree_in_recursive)
        } else {
            (false, true)
        };

        let base_len = base.len();
        base.push_str(&entry.name);

        if emit_this {
            self.emit(old, new, base);
        }

        let result = if recurse {
            base.push('/');
            self.walk(
                old.map(|e| &e.object_id),
                new.map(|e| &e.object_id),
                base,
            )
        } else {
            Ok(())
        };

        base.truncate(base_len);
        result
    }

    fn emit(&mut self, old: Option<&TreeEntry>, new: Option<&TreeEntry>, path: &str) {
        match (old, new) {
            (Some(one), Some(two)) => {
                trace!(path, "changed");
                self.sink
                    .on_change(one.mode, two.mode, &one.object_id, &two.object_id, path);
                self.queue.push(FilePair::modified(
                    DiffFile::from_entry(one, path),
                    DiffFile::from_entry(two, path),
                ));
                self.stats.changes += 1;
            }
            (None, Some(two)) => {
                trace!(path, "added");
                self.sink
                    .on_add_remove(Sign::Add, two.mode, &two.object_id, path);
                self.queue.push(FilePair::added(DiffFile::from_entry(two, path)));
                self.stats.additions += 1;
            }
            (Some(one), None) => {
                trace!(path, "removed");
                self.sink
                    .on_add_remove(Sign::Remove, one.mode, &one.object_id, path);
                self.queue.push(FilePair::deleted(DiffFile::from_entry(one, path)));
                self.stats.removals += 1;
            }
            (None, None) => unreachable!("show_path checked for an entry"),
        }
    }

    /// The pairs queued so far, in emission order.
    pub(crate) fn finish(self) -> DiffQueue {
        self.queue
    }
}
