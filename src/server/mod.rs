//! HTTP transport for the connector.
//!
//! Exposes every tool as a JSON POST endpoint under `/mcp/`, plus:
//! - the discovery manifest at `/mcp/manifest`
//! - the OpenAPI document at `/api/openapi.json`
//! - a health probe at `/health`

mod handlers;
mod routes;

pub use handlers::{ApiDoc, Manifest};
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::arcgis::{Dispatcher, HttpFetcher};
use crate::config::Settings;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(settings)?;
        Ok(Self::from_dispatcher(Dispatcher::new(
            Arc::new(fetcher),
            settings,
        )))
    }

    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
