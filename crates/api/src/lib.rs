//! # magnet-feed-api: The Wire
//!
//! **Transport and configuration for the magnet feed service.**
//!
//! This crate owns everything that touches the network: the [`FeedApi`] trait that the
//! sync layer is written against, the `surf`-backed [`HttpFeedClient`], and the
//! [`FeedConfig`] that resolves the service base URL once at startup.
//!
//! ## Endpoints
//!
//! | Method & Path | Trait method |
//! |---|---|
//! | `GET /api/files` | [`FeedApi::list_files`] |
//! | `DELETE /api/files/{id}` | [`FeedApi::remove_file`] |
//! | `PATCH /api/files/{id}/refresh` | [`FeedApi::refresh_file`] |
//! | `PATCH /api/files/refresh` | [`FeedApi::refresh_all`] |
//! | `GET /api/file-locations` | [`FeedApi::list_locations`] |
//! | `POST /api/file-locations` | [`FeedApi::assign_location`] |
//!
//! Any non-2xx status is reported as [`FeedError::Response`], whatever the body says.
//!
//! ## Usage
//!
//! ```no_run
//! use magnet_feed_api::{FeedApi, FeedConfig, HttpFeedClient};
//!
//! #[async_std::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Explicit override > MAGNET_FEED_BASE_URL > config.toml > http://localhost:8080
//!     let config = FeedConfig::load(None)?;
//!     let client = HttpFeedClient::new(&config);
//!
//!     for file in client.list_files().await? {
//!         println!("{} ({})", file.name, file.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For tests and demos, [`StubFeed`] implements the same trait in memory.

use async_trait::async_trait;
use magnet_feed_core::error::Result;
use magnet_feed_core::{FileEntry, Location, LocationAssignment};

/// surf client and request logging.
pub mod client;

/// Base URL resolution from overrides, environment and `config.toml`.
pub mod config;

/// In-memory feed service.
pub mod stub;

pub use client::HttpFeedClient;
pub use config::FeedConfig;
pub use magnet_feed_core::FeedError;
pub use stub::{Endpoint, Release, StubCall, StubFeed};

#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Fetch the full file collection.
    async fn list_files(&self) -> Result<Vec<FileEntry>>;

    /// Delete one file.
    async fn remove_file(&self, id: &str) -> Result<()>;

    /// Ask the service to re-pull torrent metadata for one file.
    async fn refresh_file(&self, id: &str) -> Result<()>;

    /// Ask the service to re-pull torrent metadata for every file.
    async fn refresh_all(&self) -> Result<()>;

    /// Fetch the full location collection.
    async fn list_locations(&self) -> Result<Vec<Location>>;

    /// Associate a file with a download location.
    async fn assign_location(&self, assignment: &LocationAssignment) -> Result<()>;
}
