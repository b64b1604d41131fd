//! Entry points for diffing two trees.

use arbor_store::ObjectStore;
use arbor_types::ObjectId;
use tracing::debug;

use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};
use crate::follow::try_to_follow_renames;
use crate::options::DiffOptions;
use crate::queue::DiffQueue;
use crate::score::{ContentScorer, ScoreParams, SimilarityScorer};
use crate::sink::{DiffSink, NullSink};
use crate::walker::TreeWalker;

/// Diffs trees read from a store.
///
/// # Example
///
/// ```
/// use arbor_diff::{DiffOptions, RecordingSink, TreeDiffer};
/// use arbor_store::{EntryMode, InMemoryObjectStore, ObjectStore, Tree, TreeEntry};
/// use arbor_types::ObjectId;
///
/// let store = InMemoryObjectStore::new();
/// let old = store.write_tree(&Tree::new(vec![
///     TreeEntry::new(EntryMode::Regular, "a", ObjectId::from_bytes(b"one")),
/// ])).unwrap();
/// let new = store.write_tree(&Tree::new(vec![
///     TreeEntry::new(EntryMode::Regular, "a", ObjectId::from_bytes(b"two")),
/// ])).unwrap();
///
/// let differ = TreeDiffer::new(&store);
/// let mut options = DiffOptions::default();
/// let mut sink = RecordingSink::new();
/// let queue = differ.diff_tree(Some(&old), Some(&new), "", &mut options, &mut sink).unwrap();
/// assert_eq!(queue.paths(), ["a"]);
/// assert_eq!(sink.paths(), ["a"]);
/// ```
pub struct TreeDiffer<'s> {
    store: &'s dyn ObjectStore,
    scorer: Box<dyn SimilarityScorer + 's>,
}

impl<'s> TreeDiffer<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self {
            store,
            scorer: Box::new(ContentScorer::new(store)),
        }
    }

    /// Use `scorer` for rename following and detection.
    pub fn with_scorer(mut self, scorer: impl SimilarityScorer + 's) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Diff `old` against `new` (absent = empty tree), reporting each event
    /// to `sink` and returning the queued pairs.
    ///
    /// `base` is the directory both trees live at: empty, or ending in `/`.
    /// When following renames from the root, a single creation is replaced
    /// by the rename or copy it came from and `options.pathspec` is
    /// rewritten to the old path; `options.found_follow` reports whether
    /// that happened.
    ///
    /// # Errors
    ///
    /// Fails with [`DiffError::InvalidBase`] when `base` is not empty and
    /// lacks a trailing `/`, and when a tree on either side cannot be read
    /// or decoded. Events already delivered to `sink` should then be
    /// discarded.
    pub fn diff_tree(
        &self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        base: &str,
        options: &mut DiffOptions,
        sink: &mut dyn DiffSink,
    ) -> DiffResult<DiffQueue> {
        if !(base.is_empty() || base.ends_with('/')) {
            return Err(DiffError::InvalidBase(base.to_owned()));
        }
        options.found_follow = false;
        debug!(
            old = ?old,
            new = ?new,
            base,
            recursive = options.recursive,
            "diffing trees"
        );

        let mut path = String::from(base);
        let queue = {
            let mut walker = TreeWalker::new(self.store, options, sink);
            walker.walk(old, new, &mut path)?;
            walker.finish()
        };

        if base.is_empty() && options.follow_renames && queue.is_single_creation() {
            return try_to_follow_renames(self.store, self.scorer.as_ref(), old, new, options, queue);
        }
        Ok(queue)
    }

    /// Diff the empty tree against `new`: everything in it is an addition.
    pub fn diff_root_tree(
        &self,
        new: &ObjectId,
        base: &str,
        options: &mut DiffOptions,
        sink: &mut dyn DiffSink,
    ) -> DiffResult<DiffQueue> {
        self.diff_tree(None, Some(new), base, options, sink)
    }

    /// Pair additions with removals and copy sources in `queue`.
    ///
    /// A queue already resolved by rename following is returned unchanged.
    pub fn detect_renames(&self, queue: DiffQueue, options: &DiffOptions) -> DiffResult<DiffQueue> {
        if options.found_follow {
            return Ok(queue);
        }
        self.scorer.score(queue, &ScoreParams::from_options(options))
    }
}

/// Diff two trees with the settings in `config`, without a path filter or
/// an event sink.
///
/// Rename following needs a single path to follow, so it is not applied
/// here.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old: &ObjectId,
    new: &ObjectId,
    config: &DiffConfig,
) -> DiffResult<DiffQueue> {
    config.validate()?;
    let differ = TreeDiffer::new(store);
    let mut options = DiffOptions {
        follow_renames: false,
        ..DiffOptions::from_config(config)
    };
    let queue = differ.diff_tree(Some(old), Some(new), "", &mut options, &mut NullSink)?;
    if config.detect_renames {
        differ.detect_renames(queue, &options)
    } else {
        Ok(queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::pathspec::Pathspec;
    use crate::queue::FileStatus;
    use crate::sink::{RecordingSink, Sign, SinkEvent};
    use crate::testutil::{blob, build_tree, files, oid};
    use arbor_store::{EntryMode, InMemoryObjectStore};
    use proptest::prelude::*;

    struct PanickingScorer;

    impl SimilarityScorer for PanickingScorer {
        fn score(&self, _: DiffQueue, _: &ScoreParams) -> DiffResult<DiffQueue> {
            panic!("scorer should not run");
        }
    }

    fn following(path: &str) -> DiffOptions {
        DiffOptions {
            follow_renames: true,
            ..Default::default()
        }
        .with_pathspec(Pathspec::new([path]).unwrap())
    }

    #[test]
    fn follows_rename_from_root() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("old_name", oid(5))]);
        let new = files(&store, &[("new_name", oid(5))]);

        let differ = TreeDiffer::new(&store);
        let mut options = following("new_name");
        let mut sink = RecordingSink::new();
        let queue = differ
            .diff_tree(Some(&old), Some(&new), "", &mut options, &mut sink)
            .unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pairs()[0].status, FileStatus::Renamed);
        assert!(options.found_follow);
        assert_eq!(options.pathspec.patterns(), ["old_name"]);
        // The sink saw the filtered walk only.
        assert_eq!(sink.paths(), ["new_name"]);
    }

    #[test]
    fn no_follow_below_root() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("old_name", oid(5))]);
        let new = files(&store, &[("new_name", oid(5))]);

        let differ = TreeDiffer::new(&store).with_scorer(PanickingScorer);
        let mut options = following("sub/new_name");
        let queue = differ
            .diff_tree(Some(&old), Some(&new), "sub/", &mut options, &mut NullSink)
            .unwrap();
        assert_eq!(queue.paths(), ["sub/new_name"]);
        assert!(!options.found_follow);
    }

    #[test]
    fn base_without_trailing_slash_is_rejected() {
        let store = InMemoryObjectStore::new();
        let tree = files(&store, &[("x", oid(1))]);
        let differ = TreeDiffer::new(&store);
        let mut sink = RecordingSink::new();

        store.reset_read_count();
        let err = differ
            .diff_root_tree(&tree, "sub", &mut DiffOptions::default(), &mut sink)
            .unwrap_err();
        assert!(matches!(err, DiffError::InvalidBase(base) if base == "sub"));
        assert!(sink.events.is_empty());
        assert_eq!(store.read_count(), 0);

        let queue = differ
            .diff_root_tree(&tree, "sub/", &mut DiffOptions::default(), &mut sink)
            .unwrap();
        assert_eq!(queue.paths(), ["sub/x"]);
    }

    #[test]
    fn no_follow_for_modification() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("x", oid(1))]);
        let new = files(&store, &[("x", oid(2))]);

        let differ = TreeDiffer::new(&store).with_scorer(PanickingScorer);
        let mut options = following("x");
        let queue = differ
            .diff_tree(Some(&old), Some(&new), "", &mut options, &mut NullSink)
            .unwrap();
        assert_eq!(queue.pairs()[0].status, FileStatus::Modified);
        assert!(!options.found_follow);
    }

    #[test]
    fn found_follow_resets_each_call() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("old_name", oid(5))]);
        let new = files(&store, &[("new_name", oid(5))]);
        let differ = TreeDiffer::new(&store);
        let mut options = following("new_name");

        differ
            .diff_tree(Some(&old), Some(&new), "", &mut options, &mut NullSink)
            .unwrap();
        assert!(options.found_follow);

        // Filter now names old_name; diffing old against itself finds nothing.
        let queue = differ
            .diff_tree(Some(&old), Some(&old), "", &mut options, &mut NullSink)
            .unwrap();
        assert!(queue.is_empty());
        assert!(!options.found_follow);
    }

    #[test]
    fn root_tree_is_all_additions() {
        let store = InMemoryObjectStore::new();
        let tree = files(&store, &[("a", oid(1)), ("d/b", oid(2))]);
        let differ = TreeDiffer::new(&store);
        let mut sink = RecordingSink::new();
        differ
            .diff_root_tree(&tree, "", &mut DiffOptions::default(), &mut sink)
            .unwrap();
        assert!(sink
            .events
            .iter()
            .all(|e| matches!(e, SinkEvent::AddRemove { sign: Sign::Add, .. })));
        assert_eq!(sink.paths(), ["a", "d/b"]);
    }

    #[test]
    fn detect_renames_skipped_after_follow() {
        let store = InMemoryObjectStore::new();
        let differ = TreeDiffer::new(&store).with_scorer(PanickingScorer);
        let options = DiffOptions {
            found_follow: true,
            ..Default::default()
        };
        let queue = differ.detect_renames(DiffQueue::new(), &options).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn diff_trees_detects_renames() {
        let store = InMemoryObjectStore::new();
        let text = blob(&store, "hello\n");
        let old = files(&store, &[("a.txt", text), ("keep", oid(1))]);
        let new = files(&store, &[("b.txt", text), ("keep", oid(1))]);

        let queue = diff_trees(&store, &old, &new, &DiffConfig::default()).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pairs()[0].status, FileStatus::Renamed);

        let plain = DiffConfig {
            detect_renames: false,
            ..Default::default()
        };
        let queue = diff_trees(&store, &old, &new, &plain).unwrap();
        assert_eq!(queue.paths(), ["a.txt", "b.txt"]);
    }

    #[test]
    fn diff_trees_rejects_bad_config() {
        let store = InMemoryObjectStore::new();
        let tree = files(&store, &[]);
        let config = DiffConfig {
            rename_threshold: 1.5,
            ..Default::default()
        };
        let err = diff_trees(&store, &tree, &tree, &config).unwrap_err();
        assert!(matches!(
            err,
            DiffError::Config(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn diff_trees_ignores_follow_flag() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[]);
        let new = build_tree(&store, &[("only", EntryMode::Regular, blob(&store, "x\n"))]);
        let config = DiffConfig {
            follow_renames: true,
            ..Default::default()
        };
        let queue = diff_trees(&store, &old, &new, &config).unwrap();
        assert_eq!(queue.paths(), ["only"]);
    }

    fn arb_tree() -> impl Strategy<Value = Vec<(String, u8)>> {
        let name = prop::sample::select(vec!["a", "b", "c", "a.b", "a0"]);
        let path = prop::collection::vec(name, 1..=3).prop_map(|parts| parts.join("/"));
        prop::collection::btree_map(path, 1u8..=4, 0..8).prop_map(|files| {
            // Drop paths that would need a name to be both a file and a directory.
            let mut kept: Vec<(String, u8)> = Vec::new();
            for (path, id) in files {
                let clash = kept.iter().any(|(other, _)| {
                    path.starts_with(&format!("{other}/")) || other.starts_with(&format!("{path}/"))
                });
                if !clash {
                    kept.push((path, id));
                }
            }
            kept
        })
    }

    fn write(store: &InMemoryObjectStore, tree: &[(String, u8)]) -> ObjectId {
        let entries: Vec<_> = tree.iter().map(|(p, b)| (p.as_str(), oid(*b))).collect();
        files(store, &entries)
    }

    fn run(store: &InMemoryObjectStore, old: &ObjectId, new: &ObjectId) -> Vec<SinkEvent> {
        let mut sink = RecordingSink::new();
        TreeDiffer::new(store)
            .diff_tree(Some(old), Some(new), "", &mut DiffOptions::default(), &mut sink)
            .unwrap();
        sink.events
    }

    proptest! {
        #[test]
        fn self_diff_is_empty(tree in arb_tree()) {
            let store = InMemoryObjectStore::new();
            let id = write(&store, &tree);
            prop_assert!(run(&store, &id, &id).is_empty());
        }

        #[test]
        fn diff_is_deterministic(old in arb_tree(), new in arb_tree()) {
            let store = InMemoryObjectStore::new();
            let (a, b) = (write(&store, &old), write(&store, &new));
            prop_assert_eq!(run(&store, &a, &b), run(&store, &a, &b));
        }

        #[test]
        fn reports_exactly_the_differing_paths(old in arb_tree(), new in arb_tree()) {
            let store = InMemoryObjectStore::new();
            let (a, b) = (write(&store, &old), write(&store, &new));
            let events = run(&store, &a, &b);

            let mut expected: Vec<&str> = Vec::new();
            for (path, id) in &old {
                match new.iter().find(|(p, _)| p == path) {
                    Some((_, other)) if other == id => {}
                    _ => expected.push(path),
                }
            }
            for (path, _) in &new {
                if !old.iter().any(|(p, _)| p == path) {
                    expected.push(path);
                }
            }
            let mut got: Vec<&str> = events.iter().map(SinkEvent::path).collect();
            got.sort_unstable();
            got.dedup();
            expected.sort_unstable();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn events_are_in_tree_order(old in arb_tree(), new in arb_tree()) {
            let store = InMemoryObjectStore::new();
            let (a, b) = (write(&store, &old), write(&store, &new));
            let paths: Vec<String> = run(&store, &a, &b)
                .iter()
                .map(|e| e.path().to_owned())
                .collect();
            // Tree order compares paths as if every directory name ended in '/'.
            for pair in paths.windows(2) {
                prop_assert!(pair[0] < pair[1], "{:?} before {:?}", pair[0], pair[1]);
            }
        }
    }
}
