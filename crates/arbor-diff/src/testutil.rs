//! Fixtures shared by the crate's tests.

use std::collections::BTreeMap;

use arbor_store::{Blob, EntryMode, ObjectStore, Tree, TreeEntry};
use arbor_types::ObjectId;

pub(crate) fn oid(b: u8) -> ObjectId {
    ObjectId::from_hash([b; 32])
}

/// Write nested trees for `files` (slash-separated paths) and return the
/// root tree's id. Intermediate directories are created as needed.
pub(crate) fn build_tree(store: &dyn ObjectStore, files: &[(&str, EntryMode, ObjectId)]) -> ObjectId {
    let mut entries = Vec::new();
    let mut subdirs: BTreeMap<&str, Vec<(&str, EntryMode, ObjectId)>> = BTreeMap::new();
    for &(path, mode, id) in files {
        match path.split_once('/') {
            Some((dir, rest)) => subdirs.entry(dir).or_default().push((rest, mode, id)),
            None => entries.push(TreeEntry::new(mode, path, id)),
        }
    }
    for (dir, children) in subdirs {
        let id = build_tree(store, &children);
        entries.push(TreeEntry::new(EntryMode::Directory, dir, id));
    }
    store.write_tree(&Tree::new(entries)).unwrap()
}

/// Shorthand for trees of regular files.
pub(crate) fn files(store: &dyn ObjectStore, files: &[(&str, ObjectId)]) -> ObjectId {
    let with_modes: Vec<_> = files
        .iter()
        .map(|&(path, id)| (path, EntryMode::Regular, id))
        .collect();
    build_tree(store, &with_modes)
}

pub(crate) fn blob(store: &dyn ObjectStore, content: &str) -> ObjectId {
    store.write(&Blob::new(content).to_stored_object()).unwrap()
}
