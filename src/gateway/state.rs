use std::sync::Arc;

use crate::index::{GenerationRegistry, Indexer};
use crate::pipeline::Pipeline;
use crate::store::ProductStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub indexer: Arc<Indexer>,
    pub registry: Arc<GenerationRegistry>,
    pub store: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<Pipeline>,
        indexer: Arc<Indexer>,
        registry: Arc<GenerationRegistry>,
        store: Arc<dyn ProductStore>,
    ) -> Self {
        Self {
            pipeline,
            indexer,
            registry,
            store,
        }
    }
}
