use crate::FeedApi;
use async_std::task;
use async_trait::async_trait;
use chrono::Utc;
use futures::channel::oneshot;
use magnet_feed_core::error::Result;
use magnet_feed_core::{FeedError, FileEntry, Location, LocationAssignment};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// One request received by [`StubFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubCall {
    ListFiles,
    RemoveFile(String),
    RefreshFile(String),
    RefreshAll,
    ListLocations,
    AssignLocation(LocationAssignment),
}

impl StubCall {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            StubCall::ListFiles => Endpoint::ListFiles,
            StubCall::RemoveFile(_) => Endpoint::RemoveFile,
            StubCall::RefreshFile(_) => Endpoint::RefreshFile,
            StubCall::RefreshAll => Endpoint::RefreshAll,
            StubCall::ListLocations => Endpoint::ListLocations,
            StubCall::AssignLocation(_) => Endpoint::AssignLocation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListFiles,
    RemoveFile,
    RefreshFile,
    RefreshAll,
    ListLocations,
    AssignLocation,
}

impl Endpoint {
    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::ListFiles | Endpoint::ListLocations => "GET",
            Endpoint::RemoveFile => "DELETE",
            Endpoint::RefreshFile | Endpoint::RefreshAll => "PATCH",
            Endpoint::AssignLocation => "POST",
        }
    }

    fn path(&self, id: Option<&str>) -> String {
        let id = id.unwrap_or("{id}");
        match self {
            Endpoint::ListFiles => "/api/files".to_string(),
            Endpoint::RemoveFile => format!("/api/files/{}", id),
            Endpoint::RefreshFile => format!("/api/files/{}/refresh", id),
            Endpoint::RefreshAll => "/api/files/refresh".to_string(),
            Endpoint::ListLocations | Endpoint::AssignLocation => "/api/file-locations".to_string(),
        }
    }

    /// The error an HTTP client would report for `status` on this endpoint.
    pub fn error(&self, status: u16, id: Option<&str>) -> FeedError {
        FeedError::Response {
            method: self.method().to_string(),
            path: self.path(id),
            status,
        }
    }
}

/// Releases a held response. Dropping it releases the response as well.
pub struct Release(oneshot::Sender<()>);

impl Release {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

struct Held<T> {
    gate: oneshot::Receiver<()>,
    result: Result<T>,
}

#[derive(Default)]
struct StubState {
    files: Vec<FileEntry>,
    locations: Vec<Location>,
    calls: Vec<StubCall>,
    failures: HashMap<Endpoint, VecDeque<FeedError>>,
    held_files: VecDeque<Held<Vec<FileEntry>>>,
    held_locations: VecDeque<Held<Vec<Location>>>,
    latency: Option<Duration>,
}

impl StubState {
    fn record(&mut self, call: StubCall) -> Result<()> {
        let endpoint = call.endpoint();
        self.calls.push(call);
        match self.failures.get_mut(&endpoint).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory feed service.
///
/// Behaves like the real service (deletions stick, refreshes bump
/// `lastSyncAt`, unknown ids answer 404) and records every call so tests can
/// assert on request order. Failures can be queued per endpoint, and list
/// responses can be held until the test releases them.
#[derive(Clone, Default)]
pub struct StubFeed {
    state: Arc<Mutex<StubState>>,
}

impl StubFeed {
    pub fn new(files: Vec<FileEntry>, locations: Vec<Location>) -> Self {
        let stub = Self::default();
        {
            let mut state = stub.lock();
            state.files = files;
            state.locations = locations;
        }
        stub
    }

    /// Delay every response, like a real network hop.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn files(&self) -> Vec<FileEntry> {
        self.lock().files.clone()
    }

    pub fn set_files(&self, files: Vec<FileEntry>) {
        self.lock().files = files;
    }

    pub fn set_locations(&self, locations: Vec<Location>) {
        self.lock().locations = locations;
    }

    pub fn calls(&self) -> Vec<StubCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .count()
    }

    /// Make the next call to `endpoint` fail with `err`.
    pub fn fail_next(&self, endpoint: Endpoint, err: FeedError) {
        self.lock()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(err);
    }

    /// Make the next call to `endpoint` answer with `status`.
    pub fn fail_next_with_status(&self, endpoint: Endpoint, status: u16) {
        self.fail_next(endpoint, endpoint.error(status, None));
    }

    /// The next `list_files` call answers `result`, but only once released.
    pub fn hold_files(&self, result: Result<Vec<FileEntry>>) -> Release {
        let (tx, gate) = oneshot::channel();
        self.lock().held_files.push_back(Held { gate, result });
        Release(tx)
    }

    /// The next `list_locations` call answers `result`, but only once released.
    pub fn hold_locations(&self, result: Result<Vec<Location>>) -> Release {
        let (tx, gate) = oneshot::channel();
        self.lock().held_locations.push_back(Held { gate, result });
        Release(tx)
    }

    /// Wait until `endpoint` has been called at least `count` times.
    pub async fn wait_for_calls(&self, endpoint: Endpoint, count: usize, timeout: Duration) -> bool {
        let started = Instant::now();
        loop {
            if self.call_count(endpoint) >= count {
                return true;
            }
            if started.elapsed() >= timeout {
                return false;
            }
            task::sleep(Duration::from_millis(2)).await;
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            task::sleep(latency).await;
        }
    }
}

#[async_trait]
impl FeedApi for StubFeed {
    async fn list_files(&self) -> Result<Vec<FileEntry>> {
        let held = {
            let mut state = self.lock();
            state.record(StubCall::ListFiles)?;
            state.held_files.pop_front()
        };
        self.simulate_latency().await;

        match held {
            Some(held) => {
                let _ = held.gate.await;
                held.result
            }
            None => Ok(self.files()),
        }
    }

    async fn remove_file(&self, id: &str) -> Result<()> {
        self.lock().record(StubCall::RemoveFile(id.to_string()))?;
        self.simulate_latency().await;

        let mut state = self.lock();
        let before = state.files.len();
        state.files.retain(|f| f.id != id);
        if state.files.len() == before {
            return Err(Endpoint::RemoveFile.error(404, Some(id)));
        }
        Ok(())
    }

    async fn refresh_file(&self, id: &str) -> Result<()> {
        self.lock().record(StubCall::RefreshFile(id.to_string()))?;
        self.simulate_latency().await;

        let mut state = self.lock();
        match state.files.iter_mut().find(|f| f.id == id) {
            Some(file) => {
                file.last_sync_at = Utc::now();
                Ok(())
            }
            None => Err(Endpoint::RefreshFile.error(404, Some(id))),
        }
    }

    async fn refresh_all(&self) -> Result<()> {
        self.lock().record(StubCall::RefreshAll)?;
        self.simulate_latency().await;

        let now = Utc::now();
        for file in self.lock().files.iter_mut() {
            file.last_sync_at = now;
        }
        Ok(())
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        let held = {
            let mut state = self.lock();
            state.record(StubCall::ListLocations)?;
            state.held_locations.pop_front()
        };
        self.simulate_latency().await;

        match held {
            Some(held) => {
                let _ = held.gate.await;
                held.result
            }
            None => Ok(self.lock().locations.clone()),
        }
    }

    async fn assign_location(&self, assignment: &LocationAssignment) -> Result<()> {
        self.lock()
            .record(StubCall::AssignLocation(assignment.clone()))?;
        self.simulate_latency().await;

        let mut state = self.lock();
        match state.files.iter_mut().find(|f| f.id == assignment.file_id) {
            Some(file) => {
                file.location = Some(assignment.location.clone());
                Ok(())
            }
            None => Err(Endpoint::AssignLocation.error(404, None)),
        }
    }
}
