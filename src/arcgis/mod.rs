//! Query translation and result aggregation for ArcGIS portals.
//!
//! Turns tool actions (list layers, query features, statistics, map export,
//! threshold tradeoffs, nearest facility) into remote query parameters and
//! reduces the remote feature collections to compact responses. Nothing here
//! keeps state between requests.

pub mod client;
pub mod dispatch;
pub mod model;
pub mod nearest;
pub mod normalize;
pub mod query;
pub mod request;
pub mod stats;
pub mod threshold;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{GeoFetcher, HttpFetcher};
pub use dispatch::Dispatcher;
pub use query::{Intent, QueryOptions, QueryRequest};
