//! `PlacesClient` collaborator interface, mirroring the `places.*` actions.
//!
//! This surface isn't wired to a real backend yet — the in-crate implementation returns
//! empty/canned results rather than fabricating a geocoding backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceNode {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[async_trait]
pub trait PlacesClient: Send + Sync {
    async fn resolve_entities(&self, query: &str, lat: Option<f64>, lng: Option<f64>, limit: usize) -> Vec<PlaceNode>;
    async fn get_poi_facts(&self, poi_ids: &[String]) -> Value;
}

/// Stub implementation: always returns no matches / empty facts.
///
/// A real deployment substitutes a geocoding and places backend; that integration is out of
/// scope here.
#[derive(Default)]
pub struct NullPlacesClient;

#[async_trait]
impl PlacesClient for NullPlacesClient {
    async fn resolve_entities(&self, _query: &str, _lat: Option<f64>, _lng: Option<f64>, _limit: usize) -> Vec<PlaceNode> {
        Vec::new()
    }

    async fn get_poi_facts(&self, _poi_ids: &[String]) -> Value {
        serde_json::json!({})
    }
}
