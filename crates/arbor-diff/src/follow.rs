//! Following a single file across a rename or copy.
//!
//! A diff filtered to one path shows a renamed file as a bare creation. When
//! that happens the trees are diffed again without the filter, the result is
//! scored for renames and copies onto the followed path, and a match found
//! there replaces the creation. The caller's filter is then pointed at the
//! old name so the next (older) comparison keeps tracking the same file.

use arbor_store::ObjectStore;
use arbor_types::ObjectId;
use tracing::debug;

use crate::error::DiffResult;
use crate::options::DiffOptions;
use crate::pathspec::Pathspec;
use crate::queue::{DiffQueue, FileStatus};
use crate::score::{ScoreParams, SimilarityScorer};
use crate::sink::NullSink;
use crate::walker::TreeWalker;

/// Replace the single creation in `queue` with the rename or copy it came
/// from, if one exists between `old` and `new`.
///
/// On success `options.pathspec` names the source path and
/// `options.found_follow` is set. Otherwise the creation is returned as is.
///
/// # Panics
///
/// Panics when `options.pathspec` is not a single literal path, or when
/// `queue` does not hold exactly one pair.
pub fn try_to_follow_renames(
    store: &dyn ObjectStore,
    scorer: &dyn SimilarityScorer,
    old: Option<&ObjectId>,
    new: Option<&ObjectId>,
    options: &mut DiffOptions,
    queue: DiffQueue,
) -> DiffResult<DiffQueue> {
    let target = match options.pathspec.single_literal() {
        Ok(path) => path.to_owned(),
        Err(err) => panic!("BUG: cannot follow renames: {err}"),
    };
    let mut pairs = queue.into_pairs();
    let fallback = match (pairs.pop(), pairs.is_empty()) {
        (Some(pair), true) => pair,
        _ => panic!("BUG: rename following expects exactly one queued pair"),
    };
    debug!(target = %target, "following renames");

    let secondary = DiffOptions {
        recursive: true,
        tree_in_recursive: false,
        find_copies_harder: true,
        follow_renames: false,
        pathspec: Pathspec::default(),
        break_threshold: options.break_threshold,
        rename_threshold: options.rename_threshold,
        single_follow: Some(target.clone()),
        quit_early: None,
        found_follow: false,
    };
    let mut sink = NullSink;
    let mut base = String::new();
    let mut walker = TreeWalker::new(store, &secondary, &mut sink);
    walker.walk(old, new, &mut base)?;
    let unfiltered = walker.finish();
    debug!(pairs = unfiltered.len(), "secondary diff done");

    let params = ScoreParams {
        find_copies: true,
        ..ScoreParams::from_options(&secondary)
    };
    let scored = scorer.score(unfiltered, &params)?;

    let adopted = scored.into_iter().find_map(|pair| {
        let source = pair.one.as_ref()?.path.clone();
        let hit = matches!(pair.status, FileStatus::Renamed | FileStatus::Copied)
            && pair.two.as_ref().is_some_and(|file| file.path == target);
        hit.then_some((pair, source))
    });

    match adopted {
        Some((pair, source)) => {
            debug!(from = %source, to = %target, status = %pair.status.letter(), "adopted followed pair");
            options.pathspec = Pathspec::literal(source);
            options.found_follow = true;
            Ok(DiffQueue::from(vec![pair]))
        }
        None => {
            debug!(target = %target, "no rename source, keeping creation");
            options.found_follow = false;
            Ok(DiffQueue::from(vec![fallback]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ContentScorer;
    use crate::testutil::{blob, files, oid};
    use arbor_store::InMemoryObjectStore;

    fn primary(
        store: &InMemoryObjectStore,
        old: &ObjectId,
        new: &ObjectId,
        options: &DiffOptions,
    ) -> DiffQueue {
        let mut sink = NullSink;
        let mut base = String::new();
        let mut walker = TreeWalker::new(store, options, &mut sink);
        walker.walk(Some(old), Some(new), &mut base).unwrap();
        walker.finish()
    }

    fn follow(
        store: &InMemoryObjectStore,
        old: ObjectId,
        new: ObjectId,
        path: &str,
    ) -> (DiffQueue, DiffOptions) {
        let mut options = DiffOptions {
            follow_renames: true,
            ..Default::default()
        }
        .with_pathspec(Pathspec::new([path]).unwrap());
        let queue = primary(store, &old, &new, &options);
        assert!(queue.is_single_creation());
        let scorer = ContentScorer::new(store);
        let result =
            try_to_follow_renames(store, &scorer, Some(&old), Some(&new), &mut options, queue)
                .unwrap();
        (result, options)
    }

    #[test]
    fn exact_rename_is_adopted() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("old_name", oid(5))]);
        let new = files(&store, &[("new_name", oid(5))]);

        let (queue, options) = follow(&store, old, new, "new_name");
        let pair = &queue.pairs()[0];
        assert_eq!(queue.len(), 1);
        assert_eq!(pair.status, FileStatus::Renamed);
        assert_eq!(pair.one.as_ref().unwrap().path, "old_name");
        assert_eq!(pair.two.as_ref().unwrap().path, "new_name");
        assert!(options.found_follow);
        assert_eq!(options.pathspec.patterns(), ["old_name"]);
    }

    #[test]
    fn creation_without_source_falls_back() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("other", blob(&store, "alpha\nbeta\n"))]);
        let new_blob = blob(&store, "one\ntwo\n");
        let new = files(&store, &[("other", blob(&store, "alpha\nbeta\n")), ("fresh", new_blob)]);

        let (queue, options) = follow(&store, old, new, "fresh");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pairs()[0].status, FileStatus::Added);
        assert_eq!(queue.paths(), ["fresh"]);
        assert!(!options.found_follow);
        assert_eq!(options.pathspec.patterns(), ["fresh"]);
    }

    #[test]
    fn copy_from_surviving_file() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("orig", oid(5))]);
        let new = files(&store, &[("orig", oid(5)), ("dup", oid(5))]);

        let (queue, options) = follow(&store, old, new, "dup");
        assert_eq!(queue.pairs()[0].status, FileStatus::Copied);
        assert_eq!(queue.pairs()[0].one.as_ref().unwrap().path, "orig");
        assert!(options.found_follow);
        assert_eq!(options.pathspec.patterns(), ["orig"]);
    }

    #[test]
    fn inexact_rename_across_directories() {
        let store = InMemoryObjectStore::new();
        let before = blob(&store, "fn main() {\n    run();\n}\n// end\n");
        let after = blob(&store, "fn main() {\n    run();\n}\n// done\n");
        let other = blob(&store, "unrelated\n");
        let old = files(&store, &[("src/a.rs", before), ("z", other)]);
        let new = files(&store, &[("lib/b.rs", after), ("z", other)]);

        let (queue, options) = follow(&store, old, new, "lib/b.rs");
        let pair = &queue.pairs()[0];
        assert_eq!(pair.status, FileStatus::Renamed);
        assert!(pair.similarity.unwrap() < 1.0);
        assert_eq!(options.pathspec.patterns(), ["src/a.rs"]);
    }

    #[test]
    fn other_renames_are_ignored() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[("a", oid(1)), ("b", oid(2))]);
        let new = files(&store, &[("a2", oid(1)), ("b2", oid(2))]);

        let (queue, options) = follow(&store, old, new, "b2");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pairs()[0].one.as_ref().unwrap().path, "b");
        assert_eq!(options.pathspec.patterns(), ["b"]);
    }

    #[test]
    #[should_panic(expected = "BUG")]
    fn wildcard_pathspec_panics() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[]);
        let new = files(&store, &[("new_name", oid(1))]);
        let mut options = DiffOptions::default().with_pathspec(Pathspec::new(["new_*"]).unwrap());
        let queue = primary(&store, &old, &new, &options);
        let scorer = ContentScorer::new(&store);
        let _ = try_to_follow_renames(&store, &scorer, Some(&old), Some(&new), &mut options, queue);
    }

    #[test]
    #[should_panic(expected = "BUG")]
    fn multiple_paths_panic() {
        let store = InMemoryObjectStore::new();
        let old = files(&store, &[]);
        let new = files(&store, &[("a", oid(1))]);
        let mut options = DiffOptions::default().with_pathspec(Pathspec::new(["a", "b"]).unwrap());
        let queue = primary(&store, &old, &new, &options);
        let scorer = ContentScorer::new(&store);
        let _ = try_to_follow_renames(&store, &scorer, Some(&old), Some(&new), &mut options, queue);
    }
}
