use crate::events::EventBus;
use crate::live::LiveCollection;
use futures::future::abortable;
use magnet_feed_api::FeedApi;
use magnet_feed_core::error::Result;
use magnet_feed_core::protocol::{DirectorySnapshot, LoadOutcome, SyncEvent};
use magnet_feed_core::FileEntry;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct DirectoryState {
    files: LiveCollection<FileEntry>,
    /// Pending mutation count per file id.
    busy: BTreeMap<String, usize>,
    /// Ids whose own reload was superseded, keyed by that reload's generation.
    /// They stay busy until a newer load settles.
    awaiting: Vec<(u64, Vec<String>)>,
}

impl DirectoryState {
    fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            files: self.files.items.clone(),
            loading: self.files.loading,
            error: self.files.error.clone(),
            busy: self.busy.keys().cloned().collect(),
        }
    }

    fn mark_busy(&mut self, ids: &[String]) {
        for id in ids {
            *self.busy.entry(id.clone()).or_insert(0) += 1;
        }
    }

    fn clear_busy(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(count) = self.busy.get_mut(id) {
                *count -= 1;
                if *count == 0 {
                    self.busy.remove(id);
                }
            }
        }
    }

    fn release_settled(&mut self) {
        let settled = self.files.settled();
        let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.awaiting)
            .into_iter()
            .partition(|(generation, _)| *generation < settled);
        self.awaiting = pending;
        for (_, ids) in done {
            self.clear_busy(&ids);
        }
    }
}

struct Inner {
    api: Arc<dyn FeedApi>,
    state: Mutex<DirectoryState>,
    events: EventBus,
}

/// The client-held collection of files and its sync state.
///
/// Cheap to clone; clones share state. Mutations never touch `files`
/// directly: they wait for the remote call and then reload.
#[derive(Clone)]
pub struct FileDirectory {
    inner: Arc<Inner>,
}

impl FileDirectory {
    pub fn new(api: Arc<dyn FeedApi>) -> Self {
        Self::with_events(api, EventBus::new())
    }

    pub fn with_events(api: Arc<dyn FeedApi>, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                state: Mutex::new(DirectoryState::default()),
                events,
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub async fn snapshot(&self) -> DirectorySnapshot {
        self.state().snapshot()
    }

    fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &DirectoryState) {
        self.inner
            .events
            .publish(SyncEvent::Directory(state.snapshot()));
    }

    /// Fetch the full collection, superseding any load still in flight.
    ///
    /// Previous files and error stay visible while loading. A failure leaves
    /// the files untouched; a superseded load changes nothing at all.
    /// Dropping the returned future before it resolves ends the load.
    pub async fn load(&self) -> LoadOutcome {
        self.run_load().await.1
    }

    async fn run_load(&self) -> (u64, LoadOutcome) {
        let (fetch, handle) = abortable(self.inner.api.list_files());

        let generation = {
            let mut state = self.state();
            let generation = state.files.begin(handle);
            self.publish(&state);
            generation
        };
        log::debug!("Loading files (generation {})", generation);
        let _guard = LoadGuard {
            directory: self,
            generation,
        };

        let result = fetch.await;

        let mut state = self.state();
        let outcome = state.files.finish(generation, result);
        match &outcome {
            LoadOutcome::Applied => {
                log::debug!("Loaded {} files", state.files.items.len());
                state.release_settled();
                self.publish(&state);
            }
            LoadOutcome::Failed(err) => {
                log::warn!("Failed to load files: {}", err);
                state.release_settled();
                self.publish(&state);
            }
            LoadOutcome::Superseded => {
                log::debug!("Dropped superseded file load (generation {})", generation);
            }
        }
        (generation, outcome)
    }

    /// Same as [`load`](Self::load); for user-triggered reloads.
    pub async fn reload(&self) -> LoadOutcome {
        self.load().await
    }

    /// Delete a file, then reload. The row stays listed (and busy) until
    /// the reload confirms it is gone.
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.mutate(vec![id.to_string()], "remove", self.inner.api.remove_file(id))
            .await
    }

    /// Ask the service to re-pull metadata for one file, then reload.
    pub async fn refresh_one(&self, id: &str) -> Result<()> {
        self.mutate(
            vec![id.to_string()],
            "refresh",
            self.inner.api.refresh_file(id),
        )
        .await
    }

    /// Ask the service to re-pull metadata for every file, then reload once.
    pub async fn refresh_all(&self) -> Result<()> {
        let ids = self
            .state()
            .files
            .items
            .iter()
            .map(|f| f.id.clone())
            .collect();
        self.mutate(ids, "refresh all", self.inner.api.refresh_all())
            .await
    }

    async fn mutate<F>(&self, ids: Vec<String>, action: &str, request: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        {
            let mut state = self.state();
            state.mark_busy(&ids);
            self.publish(&state);
        }
        let mut busy = BusyGuard {
            directory: self,
            ids,
        };

        let result = request.await;

        match &result {
            Ok(()) => {
                log::debug!("{} succeeded for {:?}, reloading", action, busy.ids);
                let (generation, outcome) = self.run_load().await;
                if outcome == LoadOutcome::Superseded {
                    let mut state = self.state();
                    state
                        .awaiting
                        .push((generation, std::mem::take(&mut busy.ids)));
                    state.release_settled();
                }
            }
            Err(err) => {
                log::warn!("{} failed for {:?}: {}", action, busy.ids, err);
                self.state().files.record_error(err.clone());
            }
        }

        drop(busy);
        result
    }
}

/// Ends a load whose future was dropped before it finished.
struct LoadGuard<'a> {
    directory: &'a FileDirectory,
    generation: u64,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.directory.state();
        if state.files.abandon(self.generation) {
            log::debug!("Abandoned file load (generation {})", self.generation);
            state.release_settled();
            self.directory.publish(&state);
        }
    }
}

/// Releases the busy marks a mutation holds, however it ends.
struct BusyGuard<'a> {
    directory: &'a FileDirectory,
    ids: Vec<String>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.directory.state();
        state.clear_busy(&self.ids);
        self.directory.publish(&state);
    }
}
