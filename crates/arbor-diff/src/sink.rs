//! Observers for the events a tree walk emits.

use arbor_store::EntryMode;
use arbor_types::ObjectId;

/// Which side an add/remove event came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Add,
    Remove,
}

impl Sign {
    pub fn as_char(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Remove => '-',
        }
    }
}

/// Receives diff events in path order as the walk produces them.
///
/// Events delivered before a walk fails are unreliable and should be
/// discarded by the caller.
pub trait DiffSink {
    /// A path present on both sides whose content or mode differs.
    fn on_change(
        &mut self,
        old_mode: EntryMode,
        new_mode: EntryMode,
        old_id: &ObjectId,
        new_id: &ObjectId,
        path: &str,
    );

    /// A path present on only one side.
    fn on_add_remove(&mut self, sign: Sign, mode: EntryMode, id: &ObjectId, path: &str);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiffSink for NullSink {
    fn on_change(&mut self, _: EntryMode, _: EntryMode, _: &ObjectId, _: &ObjectId, _: &str) {}

    fn on_add_remove(&mut self, _: Sign, _: EntryMode, _: &ObjectId, _: &str) {}
}

/// A recorded sink event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    Change {
        old_mode: EntryMode,
        new_mode: EntryMode,
        old_id: ObjectId,
        new_id: ObjectId,
        path: String,
    },
    AddRemove {
        sign: Sign,
        mode: EntryMode,
        id: ObjectId,
        path: String,
    },
}

impl SinkEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::Change { path, .. } | Self::AddRemove { path, .. } => path,
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.events.iter().map(SinkEvent::path).collect()
    }
}

impl DiffSink for RecordingSink {
    fn on_change(
        &mut self,
        old_mode: EntryMode,
        new_mode: EntryMode,
        old_id: &ObjectId,
        new_id: &ObjectId,
        path: &str,
    ) {
        self.events.push(SinkEvent::Change {
            old_mode,
            new_mode,
            old_id: *old_id,
            new_id: *new_id,
            path: path.to_owned(),
        });
    }

    fn on_add_remove(&mut self, sign: Sign, mode: EntryMode, id: &ObjectId, path: &str) {
        self.events.push(SinkEvent::AddRemove {
            sign,
            mode,
            id: *id,
            path: path.to_owned(),
        });
    }
}
