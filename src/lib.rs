//! ArcGIS connector - tool endpoints over ArcGIS portals.
//!
//! Translates tool actions into ArcGIS REST queries and reduces the results
//! to compact JSON responses for calling agents.

pub mod arcgis;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;

pub use error::{ConnectorError, ErrorKind};
