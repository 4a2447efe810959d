use crate::events::EventBus;
use crate::live::LiveCollection;
use futures::future::abortable;
use magnet_feed_api::FeedApi;
use magnet_feed_core::error::Result;
use magnet_feed_core::protocol::{LoadOutcome, RegistrySnapshot, SyncEvent};
use magnet_feed_core::{Location, LocationAssignment};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct RegistryState {
    locations: LiveCollection<Location>,
    /// `locations.error` came from a failed update, not a failed load.
    update_failed: bool,
}

impl RegistryState {
    fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            locations: self.locations.items.clone(),
            loading: self.locations.loading,
            error: self.locations.error.clone(),
        }
    }
}

struct Inner {
    api: Arc<dyn FeedApi>,
    state: Mutex<RegistryState>,
    events: EventBus,
}

/// The client-held collection of download locations.
///
/// Loaded once per session. It holds names only; which file sits where is
/// part of the directory, so `update_location` leaves `locations` alone.
#[derive(Clone)]
pub struct LocationRegistry {
    inner: Arc<Inner>,
}

impl LocationRegistry {
    pub fn new(api: Arc<dyn FeedApi>) -> Self {
        Self::with_events(api, EventBus::new())
    }

    pub fn with_events(api: Arc<dyn FeedApi>, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                state: Mutex::new(RegistryState::default()),
                events,
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.state().snapshot()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RegistryState) {
        self.inner
            .events
            .publish(SyncEvent::Registry(state.snapshot()));
    }

    /// Fetch the locations, superseding any load still in flight.
    pub async fn load(&self) -> LoadOutcome {
        let (fetch, handle) = abortable(self.inner.api.list_locations());

        let generation = {
            let mut state = self.state();
            let generation = state.locations.begin(handle);
            self.publish(&state);
            generation
        };
        let _guard = LoadGuard {
            registry: self,
            generation,
        };

        let result = fetch.await;

        let mut state = self.state();
        let outcome = state.locations.finish(generation, result);
        match &outcome {
            LoadOutcome::Applied => {
                log::debug!("Loaded {} locations", state.locations.items.len());
                state.update_failed = false;
                self.publish(&state);
            }
            LoadOutcome::Failed(err) => {
                log::warn!("Failed to load locations: {}", err);
                state.update_failed = false;
                self.publish(&state);
            }
            LoadOutcome::Superseded => {}
        }
        outcome
    }

    /// Send a new file → location association. Does not reload anything;
    /// use `SyncCoordinator::change_file_location` for that.
    ///
    /// A failure is recorded as the registry error until the next update
    /// or load succeeds.
    pub async fn update_location(&self, file_id: &str, location_id: &str) -> Result<()> {
        let assignment = LocationAssignment::new(file_id, location_id);
        let result = self.inner.api.assign_location(&assignment).await;

        let mut state = self.state();
        match &result {
            Ok(()) => {
                log::debug!("Moved {} to {}", file_id, location_id);
                if state.update_failed {
                    state.update_failed = false;
                    state.locations.error = None;
                    self.publish(&state);
                }
            }
            Err(err) => {
                log::warn!("Failed to move {} to {}: {}", file_id, location_id, err);
                state.update_failed = true;
                state.locations.record_error(err.clone());
                self.publish(&state);
            }
        }
        result
    }
}

/// Ends a load whose future was dropped before it finished.
struct LoadGuard<'a> {
    registry: &'a LocationRegistry,
    generation: u64,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.registry.state();
        if state.locations.abandon(self.generation) {
            log::debug!("Abandoned location load (generation {})", self.generation);
            self.registry.publish(&state);
        }
    }
}
