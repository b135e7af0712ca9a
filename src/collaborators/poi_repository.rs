//! `PoiRepository` collaborator interface.

use crate::models::poi::Poi;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[async_trait]
pub trait PoiRepository: Send + Sync {
    async fn get(&self, id: &str) -> Option<Poi>;
    async fn list(&self, ids: &[String]) -> Vec<Poi>;
}

/// In-memory `PoiRepository`, sufficient for tests and for the HTTP boundary when a caller
/// supplies `placeIds` rather than an inline POI list.
#[derive(Default)]
pub struct InMemoryPoiRepository {
    pois: RwLock<HashMap<String, Poi>>,
}

impl InMemoryPoiRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pois(pois: impl IntoIterator<Item = Poi>) -> Self {
        let map = pois.into_iter().map(|p| (p.id.clone(), p)).collect();
        InMemoryPoiRepository {
            pois: RwLock::new(map),
        }
    }

    pub fn insert(&self, poi: Poi) {
        self.pois.write().expect("poi repository lock poisoned").insert(poi.id.clone(), poi);
    }
}

#[async_trait]
impl PoiRepository for InMemoryPoiRepository {
    async fn get(&self, id: &str) -> Option<Poi> {
        self.pois
            .read()
            .expect("poi repository lock poisoned")
            .get(id)
            .cloned()
    }

    async fn list(&self, ids: &[String]) -> Vec<Poi> {
        let guard = self.pois.read().expect("poi repository lock poisoned");
        ids.iter().filter_map(|id| guard.get(id).cloned()).collect()
    }
}
