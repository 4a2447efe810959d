use crate::error::FeedError;
use crate::model::{FileEntry, Location};
use std::collections::BTreeSet;

/// Read-only view of the file directory at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorySnapshot {
    pub files: Vec<FileEntry>,
    pub loading: bool,
    pub error: Option<FeedError>,
    /// Files with a mutation (or its follow-up reload) still in flight.
    pub busy: BTreeSet<String>,
}

impl DirectorySnapshot {
    pub fn find(&self, id: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.busy.contains(id)
    }
}

/// Read-only view of the location registry at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    pub locations: Vec<Location>,
    pub loading: bool,
    pub error: Option<FeedError>,
}

impl RegistrySnapshot {
    pub fn resolve(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }
}

/// Pushed to subscribers whenever observable component state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Directory(DirectorySnapshot),
    Registry(RegistrySnapshot),
}

/// How a `load()` call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The response replaced the collection.
    Applied,
    /// The request failed; the previous collection is still visible.
    Failed(FeedError),
    /// A newer load was issued before this one resolved; its result was dropped.
    Superseded,
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}
