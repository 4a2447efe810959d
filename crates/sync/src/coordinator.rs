use crate::directory::FileDirectory;
use crate::registry::LocationRegistry;
use magnet_feed_core::error::Result;
use magnet_feed_core::protocol::LoadOutcome;

/// Sequences a location change with the directory reload that reflects it.
#[derive(Clone)]
pub struct SyncCoordinator {
    directory: FileDirectory,
    registry: LocationRegistry,
}

impl SyncCoordinator {
    pub fn new(directory: FileDirectory, registry: LocationRegistry) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Update the association, then reload the directory.
    ///
    /// If the update fails the directory is not reloaded and the error is
    /// returned as is.
    pub async fn change_file_location(
        &self,
        file_id: &str,
        location_id: &str,
    ) -> Result<LoadOutcome> {
        self.registry
            .update_location(file_id, location_id)
            .await?;
        Ok(self.directory.load().await)
    }
}
