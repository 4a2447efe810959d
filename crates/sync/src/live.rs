use futures::future::{AbortHandle, Aborted};
use magnet_feed_core::error::Result;
use magnet_feed_core::protocol::LoadOutcome;
use magnet_feed_core::FeedError;

/// A remotely loaded collection where the latest issued request wins.
///
/// Every `begin` bumps the generation and aborts the request it replaces.
/// `finish` only applies a result whose generation is still current, so a
/// late response can never overwrite state produced by a newer request.
pub(crate) struct LiveCollection<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<FeedError>,
    generation: u64,
    /// Latest generation that stopped being in flight, by finishing or by
    /// being abandoned.
    settled: u64,
    in_flight: Option<AbortHandle>,
}

impl<T> Default for LiveCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            generation: 0,
            settled: 0,
            in_flight: None,
        }
    }
}

impl<T> LiveCollection<T> {
    /// Register a new request and return its generation.
    pub fn begin(&mut self, handle: AbortHandle) -> u64 {
        if let Some(previous) = self.in_flight.replace(handle) {
            previous.abort();
        }
        self.generation += 1;
        self.loading = true;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn settled(&self) -> u64 {
        self.settled
    }

    pub fn finish(
        &mut self,
        generation: u64,
        result: std::result::Result<Result<Vec<T>>, Aborted>,
    ) -> LoadOutcome {
        if !self.is_current(generation) {
            return LoadOutcome::Superseded;
        }
        self.in_flight = None;
        self.loading = false;
        self.settled = generation;

        match result {
            Ok(Ok(items)) => {
                self.items = items;
                self.error = None;
                LoadOutcome::Applied
            }
            Ok(Err(err)) => {
                self.error = Some(err.clone());
                LoadOutcome::Failed(err)
            }
            // Only a newer `begin` aborts, and that also moves the generation.
            Err(Aborted) => LoadOutcome::Superseded,
        }
    }

    /// Give up on a request whose caller went away before it finished.
    /// Returns false if the request had already finished or been superseded.
    pub fn abandon(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || !self.loading {
            return false;
        }
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.loading = false;
        self.settled = generation;
        true
    }

    pub fn record_error(&mut self, err: FeedError) {
        self.error = Some(err);
    }
}
