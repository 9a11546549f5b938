//! Shared handles a pipeline run needs.

use crate::batch::UpsertBatcher;
use crate::throttle::Throttle;

/// Store, source, pacing and write batching for one run.
///
/// Generic over the store and source so tests can run pipelines against
/// in-memory fakes.
pub struct IngestContext<S, Src> {
    pub store: S,
    pub source: Src,
    pub throttle: Throttle,
    pub batcher: UpsertBatcher,
}

impl<S, Src> IngestContext<S, Src> {
    pub fn new(store: S, source: Src) -> Self {
        Self {
            store,
            source,
            throttle: Throttle::disabled(),
            batcher: UpsertBatcher::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batcher = UpsertBatcher::new(batch_size);
        self
    }
}
