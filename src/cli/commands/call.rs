//! One-shot action command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use console::style;
use serde_json::Value;

use crate::arcgis::{Dispatcher, HttpFetcher, Intent};
use crate::config::Settings;

/// Run a single action through the dispatcher and print the JSON result.
pub async fn cmd_call(
    settings: &Settings,
    action: &str,
    body: Option<&str>,
    body_file: Option<&Path>,
) -> anyhow::Result<()> {
    let intent: Intent = action.parse()?;
    let body = read_body(body, body_file).await?;

    let fetcher = HttpFetcher::new(settings)?;
    let dispatcher = Dispatcher::new(Arc::new(fetcher), settings);

    let result = match dispatcher.dispatch(intent, body).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} {} failed ({:?})", style("✗").red(), intent, e.kind());
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn read_body(body: Option<&str>, body_file: Option<&Path>) -> anyhow::Result<Value> {
    let text = match (body, body_file) {
        (Some(body), _) => body.to_string(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request body from {}", path.display()))?,
        (None, None) => return Ok(Value::Object(Default::default())),
    };
    serde_json::from_str(&text).context("Request body is not valid JSON")
}
