use std::fmt;

use crate::config::DiffConfig;
use crate::pathspec::Pathspec;

/// Running totals of the events emitted by one diff invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Paths present on both sides.
    pub changes: usize,
    /// Paths present only on the new side.
    pub additions: usize,
    /// Paths present only on the old side.
    pub removals: usize,
}

impl DiffStats {
    /// Total number of emitted events.
    pub fn total(&self) -> usize {
        self.changes + self.additions + self.removals
    }
}

/// Predicate polled once per merge step; returning `true` stops the walk.
pub type QuitPredicate = Box<dyn Fn(&DiffStats) -> bool>;

/// Per-call settings for a tree diff.
pub struct DiffOptions {
    pub recursive: bool,
    pub tree_in_recursive: bool,
    pub find_copies_harder: bool,
    pub follow_renames: bool,
    /// Restricts which paths take part. Empty means everything.
    pub pathspec: Pathspec,
    pub break_threshold: Option<f64>,
    pub rename_threshold: f64,
    /// The only destination path rename detection should consider.
    pub single_follow: Option<String>,
    pub quit_early: Option<QuitPredicate>,
    /// Set when the last `diff_tree` call followed a rename or copy. Callers
    /// read it to skip their own rename detection.
    pub found_follow: bool,
}

impl DiffOptions {
    /// Options carrying the flags and thresholds of `config`.
    pub fn from_config(config: &DiffConfig) -> Self {
        Self {
            recursive: config.recursive,
            tree_in_recursive: config.tree_in_recursive,
            find_copies_harder: config.find_copies_harder,
            follow_renames: config.follow_renames,
            pathspec: Pathspec::default(),
            break_threshold: config.break_threshold,
            rename_threshold: config.rename_threshold,
            single_follow: None,
            quit_early: None,
            found_follow: false,
        }
    }

    /// Restrict the diff to `pathspec`.
    pub fn with_pathspec(mut self, pathspec: Pathspec) -> Self {
        self.pathspec = pathspec;
        self
    }

    /// Install an early-quit predicate.
    pub fn with_quit_early(mut self, predicate: impl Fn(&DiffStats) -> bool + 'static) -> Self {
        self.quit_early = Some(Box::new(predicate));
        self
    }

    /// Stop as soon as any difference has been found.
    pub fn quick(self) -> Self {
        self.with_quit_early(|stats| stats.total() > 0)
    }

    pub(crate) fn can_quit_early(&self, stats: &DiffStats) -> bool {
        self.quit_early
            .as_ref()
            .is_some_and(|predicate| predicate(stats))
    }
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::from_config(&DiffConfig::default())
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("recursive", &self.recursive)
            .field("tree_in_recursive", &self.tree_in_recursive)
            .field("find_copies_harder", &self.find_copies_harder)
            .field("follow_renames", &self.follow_renames)
            .field("pathspec", &self.pathspec)
            .field("break_threshold", &self.break_threshold)
            .field("rename_threshold", &self.rename_threshold)
            .field("single_follow", &self.single_follow)
            .field("quit_early", &self.quit_early.is_some())
            .field("found_follow", &self.found_follow)
            .finish()
    }
}
