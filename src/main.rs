#![allow(unexpected_cfgs)]

mod actions;
mod collaborators;
mod controllers;
mod error;
mod global;
mod http_models;
mod log;
mod models;
mod planning;
mod state;

#[cfg(not(tarpaulin_include))]
mod swagger;

use crate::controllers::AxumRouter;
use crate::global::*;
use crate::state::AppState;
use axum::{Extension, routing::get_service};
use http::{Method, header::HeaderValue};
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::{
	cors::CorsLayer,
	services::{ServeDir, ServeFile},
};

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
	// Load our evironment variables
	dotenvy::dotenv().ok();
	log::init_panic_handler();
	log::init_logger();

	// Read and store loaded environment variables, falling back to sane local defaults since
	// this service no longer depends on a database connection string.
	let api_base_url = env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
	let front_end_url = env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
	let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3001".to_string());

	let state = Arc::new(AppState::default());

	/*
	/ Configure CORS
	/ CORS is needed when a frontend (running on one domain or port)
	/ wants to send HTTP requests to a backend running on another domain or port.
	/ This is needed for the frontend to send requests to the backend.
	*/
	let cors = CorsLayer::new()
		.allow_origin(
			front_end_url
				.parse::<HeaderValue>()
				.expect("Invalid frontend_url format"),
		)
		.allow_methods([Method::GET, Method::POST, Method::DELETE])
		.allow_headers([
			http::header::CONTENT_TYPE,
			http::header::ACCEPT,
			http::header::HeaderName::from_static("x-requested-with"),
		]);

	// API routes with CORS middleware
	let api_routes = AxumRouter::new().nest("/planning-policy", controllers::planning_policy::planning_policy_routes());

	let api_routes = AxumRouter::new().nest("/api", api_routes);

	#[cfg(all(not(test), debug_assertions))]
	let api_routes = crate::swagger::merge_swagger(api_routes);

	// Build the main router
	let app = axum::Router::new()
		.merge(api_routes)
		// Static files served from /dist.
		// Fallback must be index.html since react handles routing on front end
		.fallback_service(get_service(
			ServeDir::new(DIST_DIR)
				.fallback(ServeFile::new(Path::new(DIST_DIR).join("index.html"))),
		))
		.layer(Extension(state.clone()))
		.layer(cors);

	/*
	/ Bind the router to a specific port
	/ We use the SocketAddr struct to bind the router to the port
	/ We use the 0.0.0.0 address to bind the router to localhost
	/ We will bind to port 3001 for now
	*/
	let addr = SocketAddr::from_str(&bind_address).expect("Invalid BIND_ADDRESS format");
	println!("Server starting on {}", api_base_url);

	/*
	/ Serve the router ie: Start the server
	/ We will start the server with the configured router and address
	*/
	let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
	axum::serve(listener, app.into_make_service()).await?;

	Ok(())
}
