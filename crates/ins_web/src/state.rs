use ins_core::Storage;
use ins_pipeline::{Orchestrator, QueryService};
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub orchestrator: Arc<Orchestrator>,
    pub query: QueryService,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            query: QueryService::new(store.clone()),
            store,
            orchestrator,
        }
    }
}
