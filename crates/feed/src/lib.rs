//! # magnet-feed
//!
//! Client for a magnet feed service: list the files captured from magnet
//! links, trigger metadata re-syncs, move files between download locations
//! and remove entries.
//!
//! [`MagnetFeed`] wires the pieces together for one session. It resolves the
//! service base URL once, builds the HTTP client, and shares it between the
//! file directory and the location registry.
//!
//! ```no_run
//! use magnet_feed::MagnetFeed;
//!
//! #[async_std::main]
//! async fn main() -> anyhow::Result<()> {
//!     let feed = MagnetFeed::from_env(None)?;
//!     feed.start().await;
//!
//!     for row in feed.view().await.rows {
//!         println!("{} -> {:?}", row.file.name, row.location_label);
//!     }
//!
//!     feed.change_file_location("f1", "loc2").await?;
//!     Ok(())
//! }
//! ```

pub mod view;

pub use magnet_feed_api as api;
pub use magnet_feed_core as core;
pub use magnet_feed_sync as sync;

use anyhow::{Context, Result};
use futures::channel::mpsc;
use magnet_feed_api::{FeedApi, FeedConfig, HttpFeedClient};
use magnet_feed_core::protocol::{LoadOutcome, SyncEvent};
use magnet_feed_sync::{EventBus, FileDirectory, LocationRegistry, SyncCoordinator};
use std::sync::Arc;
use view::FeedView;

#[derive(Clone)]
pub struct MagnetFeed {
    events: EventBus,
    directory: FileDirectory,
    registry: LocationRegistry,
    coordinator: SyncCoordinator,
}

impl MagnetFeed {
    /// Resolve configuration (override, environment, config file) and connect.
    pub fn from_env(base_url: Option<&str>) -> Result<Self> {
        let config =
            FeedConfig::load(base_url).context("Failed to resolve feed configuration")?;
        Ok(Self::connect(&config))
    }

    pub fn connect(config: &FeedConfig) -> Self {
        let client = HttpFeedClient::new(config);
        log::info!("Connecting to magnet feed at {}", client.base_url());
        Self::with_api(Arc::new(client))
    }

    pub fn with_api(api: Arc<dyn FeedApi>) -> Self {
        let events = EventBus::new();
        let directory = FileDirectory::with_events(api.clone(), events.clone());
        let registry = LocationRegistry::with_events(api, events.clone());
        let coordinator = SyncCoordinator::new(directory.clone(), registry.clone());
        Self {
            events,
            directory,
            registry,
            coordinator,
        }
    }

    /// Initial fetch of both collections, run concurrently.
    pub async fn start(&self) -> (LoadOutcome, LoadOutcome) {
        futures::join!(self.directory.load(), self.registry.load())
    }

    pub fn directory(&self) -> &FileDirectory {
        &self.directory
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Events from both the directory and the registry.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> FeedView {
        let directory = self.directory.snapshot().await;
        let registry = self.registry.snapshot().await;
        FeedView::project(&directory, &registry)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.directory
            .remove(id)
            .await
            .with_context(|| format!("Failed to remove {}", id))
    }

    pub async fn refresh_one(&self, id: &str) -> Result<()> {
        self.directory
            .refresh_one(id)
            .await
            .with_context(|| format!("Failed to refresh {}", id))
    }

    pub async fn refresh_all(&self) -> Result<()> {
        self.directory
            .refresh_all()
            .await
            .context("Failed to refresh all files")
    }

    pub async fn change_file_location(&self, file_id: &str, location_id: &str) -> Result<()> {
        self.coordinator
            .change_file_location(file_id, location_id)
            .await
            .with_context(|| format!("Failed to move {} to {}", file_id, location_id))?;
        Ok(())
    }
}
