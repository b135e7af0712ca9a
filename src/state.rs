//! Shared collaborator handles injected into the planning-policy controller via
//! `Extension<Arc<AppState>>`.

use crate::collaborators::{
    HaversineTransitEstimator, InMemoryTripStore, NullPlacesClient, PlacesClient, TransitQuery,
    TripStore, UnavailableWebBrowseClient, WebBrowseClient,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub transit: Arc<dyn TransitQuery>,
    pub places: Arc<dyn PlacesClient>,
    pub trips: Arc<dyn TripStore>,
    pub webbrowse: Arc<dyn WebBrowseClient>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            transit: Arc::new(HaversineTransitEstimator::default()),
            places: Arc::new(NullPlacesClient),
            trips: Arc::new(InMemoryTripStore::new()),
            webbrowse: Arc::new(UnavailableWebBrowseClient),
        }
    }
}
