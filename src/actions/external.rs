//! `places.*`, `transport.*` and `webbrowse.*` actions, wrapping the external-facing
//! collaborator interfaces behind the action registry.

use super::{Action, ActionCost, ActionMetadata, ActionRuntimeKind, SideEffect};
use crate::collaborators::transit_query::{build_time_matrix, GeoPoint};
use crate::collaborators::{PlacesClient, WebBrowseClient};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub struct PlacesResolveEntities {
    pub client: Arc<dyn PlacesClient>,
}

#[async_trait]
impl Action for PlacesResolveEntities {
    fn name(&self) -> &'static str {
        "places.resolve_entities"
    }

    fn description(&self) -> &'static str {
        "Resolve a free-text query plus optional coordinates into candidate place nodes."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::External,
            cost: ActionCost::Medium,
            side_effect: SideEffect::CallsApi,
            preconditions: &[],
            idempotent: true,
            cacheable: true,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            query: String,
            lat: Option<f64>,
            lng: Option<f64>,
            #[serde(default = "default_limit")]
            limit: usize,
        }
        fn default_limit() -> usize {
            10
        }
        let In { query, lat, lng, limit } = serde_json::from_value(input).map_err(|e| e.to_string())?;
        let nodes = self.client.resolve_entities(&query, lat, lng, limit).await;
        Ok(serde_json::json!({ "nodes": nodes }))
    }
}

pub struct PlacesGetPoiFacts {
    pub client: Arc<dyn PlacesClient>,
}

#[async_trait]
impl Action for PlacesGetPoiFacts {
    fn name(&self) -> &'static str {
        "places.get_poi_facts"
    }

    fn description(&self) -> &'static str {
        "Fetch current facts (hours, closures, crowd level) for a batch of POI ids."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::External,
            cost: ActionCost::Medium,
            side_effect: SideEffect::CallsApi,
            preconditions: &[],
            idempotent: true,
            cacheable: true,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            poi_ids: Vec<String>,
        }
        let In { poi_ids } = serde_json::from_value(input).map_err(|e| e.to_string())?;
        Ok(self.client.get_poi_facts(&poi_ids).await)
    }
}

pub struct TransportBuildTimeMatrix;

#[async_trait]
impl Action for TransportBuildTimeMatrix {
    fn name(&self) -> &'static str {
        "transport.build_time_matrix"
    }

    fn description(&self) -> &'static str {
        "Build the n-by-n api/robust travel-time matrices for a set of points."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::Internal,
            cost: ActionCost::Low,
            side_effect: SideEffect::None,
            preconditions: &[],
            idempotent: true,
            cacheable: true,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            nodes: Vec<GeoPoint>,
            #[serde(default = "default_walk_kmh")]
            base_walk_kmh: f64,
        }
        fn default_walk_kmh() -> f64 {
            4.5
        }
        let In { nodes, base_walk_kmh } = serde_json::from_value(input).map_err(|e| e.to_string())?;
        let (api, robust) = build_time_matrix(&nodes, base_walk_kmh);
        Ok(serde_json::json!({ "time_matrix_api": api, "time_matrix_robust": robust }))
    }
}

pub struct WebbrowseBrowse {
    pub client: Arc<dyn WebBrowseClient>,
}

#[async_trait]
impl Action for WebbrowseBrowse {
    fn name(&self) -> &'static str {
        "webbrowse.browse"
    }

    fn description(&self) -> &'static str {
        "Fetch a URL's content through the web-browse collaborator, if one is configured."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::External,
            cost: ActionCost::High,
            side_effect: SideEffect::CallsApi,
            preconditions: &[],
            idempotent: true,
            cacheable: false,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            url: String,
        }
        let In { url } = serde_json::from_value(input).map_err(|e| e.to_string())?;
        let body = self.client.browse(&url).await?;
        Ok(serde_json::json!({ "body": body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_time_matrix_action_returns_square_matrices() {
        let action = TransportBuildTimeMatrix;
        let out = action
            .run(serde_json::json!({ "nodes": [{"lat": 0.0, "lng": 0.0}, {"lat": 1.0, "lng": 1.0}] }))
            .await
            .unwrap();
        assert_eq!(out["time_matrix_api"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn webbrowse_action_surfaces_collaborator_error() {
        let action = WebbrowseBrowse {
            client: Arc::new(crate::collaborators::webbrowse::UnavailableWebBrowseClient),
        };
        let result = action.run(serde_json::json!({ "url": "https://example.com" })).await;
        assert!(result.is_err());
    }
}
