//! Client-side synchronization state for the magnet feed.
//!
//! [`FileDirectory`] and [`LocationRegistry`] each hold one remotely loaded
//! collection together with its `loading` and `error` state. Both apply
//! *last request wins*: starting a load aborts the one in flight and any
//! late result is discarded. [`SyncCoordinator`] chains a location change
//! with the directory reload that makes it visible.
//!
//! State is read through snapshots, or pushed through an [`EventBus`].

mod coordinator;
mod directory;
mod events;
mod live;
mod registry;

pub use coordinator::SyncCoordinator;
pub use directory::FileDirectory;
pub use events::EventBus;
pub use magnet_feed_core::protocol::{DirectorySnapshot, LoadOutcome, RegistrySnapshot, SyncEvent};
pub use registry::LocationRegistry;
