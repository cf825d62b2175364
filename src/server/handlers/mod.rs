//! HTTP request handlers for the web server.

mod api;
mod manifest;
mod openapi;
mod tools;

// Re-export handlers for use by the router
pub use api::health;
pub use manifest::{manifest, Manifest};
pub use openapi::{openapi_spec, ApiDoc};
pub use tools::{
    call_action, export_map, get_nearest_facility, get_statistics,
    get_tradeoffs, list_layers, query_features,
};
