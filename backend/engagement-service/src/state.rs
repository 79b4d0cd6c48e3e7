use std::sync::Arc;

use crate::repository::{EdgeStore, EntityStore};
use crate::services::{AggregationEngine, CascadeCoordinator, ToggleEngine};

/// Shared handler state: the two stores and the engines built on them
#[derive(Clone)]
pub struct AppState {
    pub toggles: ToggleEngine,
    pub cascades: CascadeCoordinator,
    pub views: AggregationEngine,
    entities: Arc<dyn EntityStore>,
}

impl AppState {
    pub fn new(entities: Arc<dyn EntityStore>, edges: Arc<dyn EdgeStore>) -> Self {
        Self {
            toggles: ToggleEngine::new(entities.clone(), edges.clone()),
            cascades: CascadeCoordinator::new(entities.clone(), edges.clone()),
            views: AggregationEngine::new(entities.clone(), edges),
            entities,
        }
    }

    pub fn entities(&self) -> &Arc<dyn EntityStore> {
        &self.entities
    }
}
