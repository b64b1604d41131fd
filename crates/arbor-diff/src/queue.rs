//! File pairs and the queue one diff invocation produces.

use arbor_store::{EntryMode, TreeEntry};
use arbor_types::ObjectId;

/// One side of a [`FilePair`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffFile {
    /// Full path from the diff root.
    pub path: String,
    pub mode: EntryMode,
    pub id: ObjectId,
}

impl DiffFile {
    pub fn new(path: impl Into<String>, mode: EntryMode, id: ObjectId) -> Self {
        Self {
            path: path.into(),
            mode,
            id,
        }
    }

    pub(crate) fn from_entry(entry: &TreeEntry, path: &str) -> Self {
        Self::new(path, entry.mode, entry.object_id)
    }
}

/// How a pair's two sides relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
}

impl FileStatus {
    /// Single-letter status code (`A`, `D`, `M`, `R`, `C`).
    pub fn letter(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Modified => 'M',
            Self::Renamed => 'R',
            Self::Copied => 'C',
        }
    }
}

/// Correspondence between an old and a new version of a path.
///
/// At least one side is always present.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePair {
    pub one: Option<DiffFile>,
    pub two: Option<DiffFile>,
    pub status: FileStatus,
    /// Content similarity in `0.0..=1.0`, set by rename/copy detection.
    pub similarity: Option<f64>,
}

impl FilePair {
    pub fn added(two: DiffFile) -> Self {
        Self {
            one: None,
            two: Some(two),
            status: FileStatus::Added,
            similarity: None,
        }
    }

    pub fn deleted(one: DiffFile) -> Self {
        Self {
            one: Some(one),
            two: None,
            status: FileStatus::Deleted,
            similarity: None,
        }
    }

    pub fn modified(one: DiffFile, two: DiffFile) -> Self {
        Self {
            one: Some(one),
            two: Some(two),
            status: FileStatus::Modified,
            similarity: None,
        }
    }

    /// A rename or copy found by similarity scoring.
    pub fn moved(one: DiffFile, two: DiffFile, status: FileStatus, similarity: f64) -> Self {
        Self {
            one: Some(one),
            two: Some(two),
            status,
            similarity: Some(similarity),
        }
    }

    /// The path this pair is reported under: the new side's, else the old.
    pub fn path(&self) -> &str {
        match (&self.two, &self.one) {
            (Some(file), _) | (None, Some(file)) => &file.path,
            (None, None) => "",
        }
    }

    /// Returns `true` when the old side is absent.
    pub fn is_creation(&self) -> bool {
        self.one.is_none()
    }

    /// Returns `true` when both sides carry the same content and mode.
    pub fn is_unmodified(&self) -> bool {
        match (&self.one, &self.two) {
            (Some(one), Some(two)) => one.id == two.id && one.mode == two.mode,
            _ => false,
        }
    }
}

/// Ordered pairs produced by one diff invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffQueue {
    pairs: Vec<FilePair>,
}

impl DiffQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pair: FilePair) {
        self.pairs.push(pair);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilePair> {
        self.pairs.iter()
    }

    pub fn pairs(&self) -> &[FilePair] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<FilePair> {
        self.pairs
    }

    /// Returns `true` for exactly one pair whose old side is absent: the
    /// shape a rename of a followed file takes in a filtered diff.
    pub fn is_single_creation(&self) -> bool {
        matches!(self.pairs.as_slice(), [pair] if pair.is_creation())
    }

    /// Reported paths in queue order.
    pub fn paths(&self) -> Vec<&str> {
        self.pairs.iter().map(FilePair::path).collect()
    }
}

impl From<Vec<FilePair>> for DiffQueue {
    fn from(pairs: Vec<FilePair>) -> Self {
        Self { pairs }
    }
}

impl FromIterator<FilePair> for DiffQueue {
    fn from_iter<I: IntoIterator<Item = FilePair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DiffQueue {
    type Item = FilePair;
    type IntoIter = std::vec::IntoIter<FilePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiffQueue {
    type Item = &'a FilePair;
    type IntoIter = std::slice::Iter<'a, FilePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
