//! Rename and copy detection over a finished diff queue.
//!
//! Added paths are matched against deleted paths (and, when copies are
//! wanted, against every surviving old path) by content. Identical blobs
//! pair first; the rest are scored by line similarity of their text.

use std::cmp::Ordering;
use std::collections::HashMap;

use arbor_store::{EntryMode, ObjectKind, ObjectStore};
use arbor_types::ObjectId;
use similar::TextDiff;
use tracing::{debug, trace};

use crate::error::{DiffError, DiffResult};
use crate::options::DiffOptions;
use crate::queue::{DiffFile, DiffQueue, FilePair, FileStatus};

/// Thresholds and scope for one scoring pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreParams {
    /// Split modifications at least this dissimilar into a delete and an add.
    pub break_threshold: Option<f64>,
    /// Minimum similarity for an inexact rename or copy.
    pub rename_threshold: f64,
    /// Use modified and unchanged old paths as copy sources.
    pub find_copies: bool,
    /// When set, only this added path is matched against sources.
    pub single_follow: Option<String>,
}

impl ScoreParams {
    pub fn from_options(options: &DiffOptions) -> Self {
        Self {
            break_threshold: options.break_threshold,
            rename_threshold: options.rename_threshold,
            find_copies: options.find_copies_harder,
            single_follow: options.single_follow.clone(),
        }
    }
}

/// Pairs additions with the removals or existing files they came from.
pub trait SimilarityScorer {
    fn score(&self, queue: DiffQueue, params: &ScoreParams) -> DiffResult<DiffQueue>;
}

/// Scores blobs read from an object store.
pub struct ContentScorer<'s> {
    store: &'s dyn ObjectStore,
}

impl<'s> ContentScorer<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self { store }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Origin {
    Deleted,
    Broken(usize),
    Kept,
}

struct Source {
    file: DiffFile,
    origin: Origin,
    claims: usize,
}

struct Destination {
    file: DiffFile,
    broken: Option<usize>,
    matched: Option<(usize, FileStatus, f64)>,
}

struct BrokenPair {
    pair: FilePair,
    source_claimed: bool,
    dest_claimed: bool,
}

struct Candidate {
    exact: bool,
    score: f64,
    dst: usize,
    src: usize,
}

impl SimilarityScorer for ContentScorer<'_> {
    fn score(&self, queue: DiffQueue, params: &ScoreParams) -> DiffResult<DiffQueue> {
        let mut blobs = BlobCache::new(self.store);
        let mut out = Vec::with_capacity(queue.len());
        let mut sources: Vec<Source> = Vec::new();
        let mut dests: Vec<Destination> = Vec::new();
        let mut broken: Vec<BrokenPair> = Vec::new();

        let wanted = |file: &DiffFile| {
            params
                .single_follow
                .as_deref()
                .map_or(true, |target| target == file.path)
        };

        for pair in queue {
            if is_tree_like(&pair) {
                out.push(pair);
                continue;
            }
            let FilePair {
                one,
                two,
                status,
                similarity,
            } = pair;
            match (status, one, two) {
                (FileStatus::Added, None, Some(two)) if wanted(&two) => dests.push(Destination {
                    file: two,
                    broken: None,
                    matched: None,
                }),
                (FileStatus::Deleted, Some(one), None) => sources.push(Source {
                    file: one,
                    origin: Origin::Deleted,
                    claims: 0,
                }),
                (FileStatus::Modified, Some(one), Some(two)) => {
                    let unchanged = one.id == two.id && one.mode == two.mode;
                    if unchanged {
                        if params.find_copies {
                            sources.push(Source {
                                file: one,
                                origin: Origin::Kept,
                                claims: 0,
                            });
                        }
                    } else if should_break(&mut blobs, &one, &two, params.break_threshold)? {
                        let idx = broken.len();
                        trace!(path = %one.path, "breaking modification");
                        sources.push(Source {
                            file: one.clone(),
                            origin: Origin::Broken(idx),
                            claims: 0,
                        });
                        if wanted(&two) {
                            dests.push(Destination {
                                file: two.clone(),
                                broken: Some(idx),
                                matched: None,
                            });
                        }
                        broken.push(BrokenPair {
                            pair: FilePair::modified(one, two),
                            source_claimed: false,
                            dest_claimed: false,
                        });
                    } else {
                        if params.find_copies {
                            sources.push(Source {
                                file: one.clone(),
                                origin: Origin::Kept,
                                claims: 0,
                            });
                        }
                        out.push(FilePair::modified(one, two));
                    }
                }
                (status, one, two) => out.push(FilePair {
                    one,
                    two,
                    status,
                    similarity,
                }),
            }
        }

        let candidates = collect_candidates(&mut blobs, &sources, &dests, params.rename_threshold)?;
        for c in candidates {
            if dests[c.dst].matched.is_some() {
                continue;
            }
            let source = &mut sources[c.src];
            source.claims += 1;
            let status = match source.origin {
                Origin::Deleted | Origin::Broken(_) if source.claims == 1 => FileStatus::Renamed,
                _ => FileStatus::Copied,
            };
            trace!(
                from = %source.file.path,
                to = %dests[c.dst].file.path,
                score = c.score,
                status = %status.letter(),
                "matched"
            );
            dests[c.dst].matched = Some((c.src, status, c.score));
        }

        for dst in dests {
            match dst.matched {
                Some((src, status, score)) => {
                    if let Some(idx) = dst.broken {
                        broken[idx].dest_claimed = true;
                    }
                    out.push(FilePair::moved(sources[src].file.clone(), dst.file, status, score));
                }
                None if dst.broken.is_none() => out.push(FilePair::added(dst.file)),
                None => {}
            }
        }

        for source in sources {
            match source.origin {
                Origin::Deleted if source.claims == 0 => out.push(FilePair::deleted(source.file)),
                Origin::Broken(idx) => broken[idx].source_claimed = source.claims > 0,
                _ => {}
            }
        }

        for b in broken {
            match (b.source_claimed, b.dest_claimed) {
                (false, false) => out.push(b.pair),
                (source_claimed, dest_claimed) => {
                    let FilePair { one, two, .. } = b.pair;
                    if let (false, Some(one)) = (source_claimed, one) {
                        out.push(FilePair::deleted(one));
                    }
                    if let (false, Some(two)) = (dest_claimed, two) {
                        out.push(FilePair::added(two));
                    }
                }
            }
        }

        out.retain(|pair| !pair.is_unmodified() || pair.status != FileStatus::Modified);
        out.sort_by(|a, b| a.path().cmp(b.path()));
        debug!(pairs = out.len(), "similarity scoring done");
        Ok(DiffQueue::from(out))
    }
}

fn is_tree_like(pair: &FilePair) -> bool {
    [&pair.one, &pair.two]
        .into_iter()
        .flatten()
        .any(|f| matches!(f.mode, EntryMode::Directory | EntryMode::Gitlink))
}

/// Symlinks only pair with symlinks.
fn compatible(a: EntryMode, b: EntryMode) -> bool {
    (a == EntryMode::Symlink) == (b == EntryMode::Symlink)
}

fn should_break(
    blobs: &mut BlobCache<'_>,
    one: &DiffFile,
    two: &DiffFile,
    threshold: Option<f64>,
) -> DiffResult<bool> {
    let Some(threshold) = threshold else {
        return Ok(false);
    };
    if !compatible(one.mode, two.mode) {
        return Ok(false);
    }
    let similarity = blobs.similarity(&one.id, &two.id)?;
    Ok(1.0 - similarity >= threshold)
}

fn collect_candidates(
    blobs: &mut BlobCache<'_>,
    sources: &[Source],
    dests: &[Destination],
    threshold: f64,
) -> DiffResult<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for (d, dst) in dests.iter().enumerate() {
        let usable = |src: &Source| {
            compatible(src.file.mode, dst.file.mode)
                && !matches!((src.origin, dst.broken), (Origin::Broken(a), Some(b)) if a == b)
        };

        let before = candidates.len();
        for (s, src) in sources.iter().enumerate() {
            if usable(src) && src.file.id == dst.file.id {
                candidates.push(Candidate {
                    exact: true,
                    score: 1.0,
                    dst: d,
                    src: s,
                });
            }
        }
        if candidates.len() > before {
            continue;
        }

        for (s, src) in sources.iter().enumerate() {
            if !usable(src) {
                continue;
            }
            let score = blobs.similarity(&src.file.id, &dst.file.id)?;
            if score >= threshold {
                candidates.push(Candidate {
                    exact: false,
                    score,
                    dst: d,
                    src: s,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.exact
            .cmp(&a.exact)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
            .then_with(|| dests[a.dst].file.path.cmp(&dests[b.dst].file.path))
            .then_with(|| sources[a.src].file.path.cmp(&sources[b.src].file.path))
    });
    Ok(candidates)
}

/// Blob text loaded at most once per scoring pass.
struct BlobCache<'s> {
    store: &'s dyn ObjectStore,
    texts: HashMap<ObjectId, String>,
}

impl<'s> BlobCache<'s> {
    fn new(store: &'s dyn ObjectStore) -> Self {
        Self {
            store,
            texts: HashMap::new(),
        }
    }

    fn load(&mut self, id: &ObjectId) -> DiffResult<()> {
        if self.texts.contains_key(id) {
            return Ok(());
        }
        let stored = self
            .store
            .read(id)?
            .ok_or(DiffError::ObjectNotFound(*id))?;
        if stored.kind != ObjectKind::Blob {
            return Err(DiffError::UnexpectedObjectKind {
                id: *id,
                expected: ObjectKind::Blob,
                actual: stored.kind,
            });
        }
        let text = String::from_utf8_lossy(&stored.data).into_owned();
        self.texts.insert(*id, text);
        Ok(())
    }

    fn similarity(&mut self, a: &ObjectId, b: &ObjectId) -> DiffResult<f64> {
        if a == b {
            return Ok(1.0);
        }
        self.load(a)?;
        self.load(b)?;
        let (Some(old), Some(new)) = (self.texts.get(a), self.texts.get(b)) else {
            return Ok(0.0);
        };
        Ok(f64::from(TextDiff::from_lines(old.as_str(), new.as_str()).ratio()))
    }
}
