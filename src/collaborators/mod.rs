//! Narrow async interfaces to everything the planning core treats as external.
//!
//! Each trait here is deliberately small: the core depends on the trait, never on a concrete
//! database, HTTP client, or browser.

pub mod places;
pub mod poi_repository;
pub mod transit_query;
pub mod trip_store;
pub mod webbrowse;

pub use places::{NullPlacesClient, PlaceNode, PlacesClient};
pub use poi_repository::{InMemoryPoiRepository, PoiRepository};
pub use transit_query::{GeoPoint, HaversineTransitEstimator, TransitQuery};
pub use trip_store::{InMemoryTripStore, TripDraft, TripEdit, TripStore};
pub use webbrowse::{UnavailableWebBrowseClient, WebBrowseClient};
