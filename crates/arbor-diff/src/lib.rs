//! Tree diff engine for Arbor.
//!
//! Compares two stored trees and reports which paths were added, removed or
//! changed. Both trees are walked together in tree order, so unchanged
//! subtrees (same id on both sides) are skipped without being read.
//!
//! # Key Types
//!
//! - [`TreeDiffer`] -- entry point: diff two trees, optionally following a
//!   single file across renames
//! - [`DiffOptions`] / [`DiffConfig`] -- per-call settings and their
//!   file-backed defaults
//! - [`Pathspec`] -- path filter with literal and wildcard patterns
//! - [`DiffSink`] -- observer receiving events in path order
//! - [`DiffQueue`] / [`FilePair`] -- the pairs a diff produced
//! - [`SimilarityScorer`] / [`ContentScorer`] -- rename and copy detection
//!
//! # Ordering
//!
//! Entries compare by name as if every directory name ended in `/`. A file
//! `foo` and a directory `foo` are therefore different paths: replacing one
//! with the other is reported as a removal plus an addition.

pub mod config;
pub mod cursor;
pub mod differ;
pub mod error;
pub mod follow;
pub mod options;
pub mod pathspec;
pub mod queue;
pub mod score;
pub mod sink;
mod walker;

#[cfg(test)]
mod testutil;

pub use config::DiffConfig;
pub use cursor::{compare_cursors, TreeCursor};
pub use differ::{diff_trees, TreeDiffer};
pub use error::{ConfigError, DiffError, DiffResult, PathspecError};
pub use follow::try_to_follow_renames;
pub use options::{DiffOptions, DiffStats, QuitPredicate};
pub use pathspec::{skip_uninteresting, Interest, Pathspec, PathspecItem};
pub use queue::{DiffFile, DiffQueue, FilePair, FileStatus};
pub use score::{ContentScorer, ScoreParams, SimilarityScorer};
pub use sink::{DiffSink, NullSink, RecordingSink, Sign, SinkEvent};
