//! Path filters and the cursor pruning they drive.
//!
//! A [`Pathspec`] is a list of items, each either a literal path (matching
//! that path and everything below it) or a wildcard pattern. Matching is
//! done one tree entry at a time against the directory currently being
//! walked, so that whole runs of sorted siblings, and whole subtrees, can be
//! skipped without being read.

use std::cmp::Ordering;

use arbor_store::{base_name_cmp, TreeEntry};
use globset::{GlobBuilder, GlobMatcher};

use crate::cursor::TreeCursor;
use crate::error::PathspecError;

/// Verdict for one tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interest {
    /// This entry does not match, but a later sibling might.
    NotInteresting,
    /// This entry matches, or leads to a match below it.
    Interesting,
    /// Neither this entry nor any later sibling can match.
    AllNotInteresting,
}

/// Per-item verdict before items are combined.
enum ItemMatch {
    Match,
    /// Could match a later sibling.
    Pending,
    /// Cannot match this entry or any later sibling.
    Passed,
}

/// One compiled pathspec pattern.
#[derive(Clone, Debug)]
pub struct PathspecItem {
    pattern: String,
    /// Unescaped text before the first wildcard. Equal to `pattern` for
    /// literal items.
    literal_prefix: String,
    glob: Option<GlobMatcher>,
}

impl PathspecItem {
    fn literal(pattern: String) -> Self {
        Self {
            literal_prefix: pattern.clone(),
            pattern,
            glob: None,
        }
    }

    fn compile(raw: &str) -> Result<Self, PathspecError> {
        let pattern = raw.trim_end_matches('/');
        let invalid = |reason: &str| PathspecError::InvalidPattern {
            pattern: raw.to_owned(),
            reason: reason.to_owned(),
        };
        if pattern.is_empty() {
            return Err(invalid("empty pattern"));
        }
        if pattern.starts_with('/') {
            return Err(invalid("absolute paths are not allowed"));
        }
        if pattern
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(invalid("empty, '.' or '..' path component"));
        }

        let (prefix, wildcard) = literal_prefix(pattern);
        if !wildcard {
            return Ok(Self::literal(prefix));
        }
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .backslash_escape(true)
            .build()
            .map_err(|e| invalid(&e.to_string()))?
            .compile_matcher();
        Ok(Self {
            pattern: pattern.to_owned(),
            literal_prefix: prefix,
            glob: Some(glob),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn has_wildcard(&self) -> bool {
        self.glob.is_some()
    }

    fn check(&self, base: &str, name: &str, is_dir: bool) -> ItemMatch {
        match &self.glob {
            None => self.check_literal(base, name, is_dir),
            Some(glob) => self.check_glob(glob, base, name, is_dir),
        }
    }

    fn check_literal(&self, base: &str, name: &str, is_dir: bool) -> ItemMatch {
        let pattern = self.pattern.as_str();

        // Walking inside the matched directory already.
        if base.len() > pattern.len()
            && base.starts_with(pattern)
            && base.as_bytes()[pattern.len()] == b'/'
        {
            return ItemMatch::Match;
        }

        let Some(rest) = pattern.strip_prefix(base) else {
            return ItemMatch::Passed;
        };
        let (component, deeper) = match rest.split_once('/') {
            Some((component, _)) => (component, true),
            None => (rest, false),
        };
        if name == component && (!deeper || is_dir) {
            return ItemMatch::Match;
        }
        // Siblings are sorted; compare against the largest key the component
        // can have, its directory form.
        match base_name_cmp(name, is_dir, component, true) {
            Ordering::Greater => ItemMatch::Passed,
            _ => ItemMatch::Pending,
        }
    }

    fn check_glob(&self, glob: &GlobMatcher, base: &str, name: &str, is_dir: bool) -> ItemMatch {
        let prefix = self.literal_prefix.as_str();
        if !base.starts_with(prefix) && !prefix.starts_with(base) {
            return ItemMatch::Passed;
        }

        let path = format!("{base}{name}");
        if glob.is_match(&path) {
            return ItemMatch::Match;
        }
        if is_dir {
            let dir = format!("{path}/");
            if dir.starts_with(prefix) || prefix.starts_with(dir.as_str()) {
                return ItemMatch::Match;
            }
        }
        ItemMatch::Pending
    }
}

/// Compiled path filter. The empty pathspec matches everything.
#[derive(Clone, Debug, Default)]
pub struct Pathspec {
    items: Vec<PathspecItem>,
}

impl Pathspec {
    /// Compile `patterns`. Patterns containing an unescaped `*`, `?` or `[`
    /// are globs, in which `*` also matches across `/` and `{a,b}` is an
    /// alternation. A backslash makes the next character literal.
    pub fn new<I, S>(patterns: I) -> Result<Self, PathspecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = patterns
            .into_iter()
            .map(|p| PathspecItem::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { items })
    }

    /// A single path matched literally, wildcard characters included.
    pub fn literal(path: impl Into<String>) -> Self {
        let mut path = path.into();
        while path.ends_with('/') {
            path.pop();
        }
        Self {
            items: vec![PathspecItem::literal(path)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[PathspecItem] {
        &self.items
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.items.iter().map(PathspecItem::pattern).collect()
    }

    /// The one literal path this pathspec names.
    ///
    /// Fails when there are several items or the item uses wildcards;
    /// following a file needs exactly one unambiguous path.
    pub fn single_literal(&self) -> Result<&str, PathspecError> {
        match self.items.as_slice() {
            [item] if !item.has_wildcard() => Ok(&item.pattern),
            [item] => Err(PathspecError::UnsupportedMagic(format!(
                "wildcard pattern {:?}",
                item.pattern
            ))),
            items => Err(PathspecError::UnsupportedMagic(format!(
                "expected exactly one path, got {}",
                items.len()
            ))),
        }
    }

    /// Test `entry`, found in the directory `base` (empty, or ending in
    /// `/`), against every item.
    pub fn interest(&self, entry: &TreeEntry, base: &str) -> Interest {
        if self.items.is_empty() {
            return Interest::Interesting;
        }
        let is_dir = entry.mode.is_dir();
        let mut exhausted = true;
        for item in &self.items {
            match item.check(base, &entry.name, is_dir) {
                ItemMatch::Match => return Interest::Interesting,
                ItemMatch::Pending => exhausted = false,
                ItemMatch::Passed => {}
            }
        }
        if exhausted {
            Interest::AllNotInteresting
        } else {
            Interest::NotInteresting
        }
    }
}

/// Advance `cursor` to its next interesting entry, or exhaust it.
pub fn skip_uninteresting(cursor: &mut TreeCursor, base: &str, pathspec: &Pathspec) {
    while let Some(entry) = cursor.current() {
        match pathspec.interest(entry, base) {
            Interest::Interesting => break,
            Interest::NotInteresting => cursor.advance(),
            Interest::AllNotInteresting => {
                cursor.exhaust();
                break;
            }
        }
    }
}

/// The part of `pattern` before its first unescaped wildcard, with
/// backslash escapes removed, and whether a wildcard follows it.
fn literal_prefix(pattern: &str) -> (String, bool) {
    let mut prefix = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => prefix.push(chars.next().unwrap_or('\\')),
            '*' | '?' | '[' => return (prefix, true),
            other => prefix.push(other),
        }
    }
    (prefix, false)
}
