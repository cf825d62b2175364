//! In-memory fetcher for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::client::GeoFetcher;
use super::query::QueryRequest;
use crate::error::ConnectorError;

enum Reply {
    Json(Value),
    Fail(String),
}

/// Records every outbound request and answers with a canned reply.
pub(crate) struct RecordingFetcher {
    reply: Reply,
    requests: Mutex<Vec<QueryRequest>>,
}

impl RecordingFetcher {
    pub fn returning(payload: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Json(payload),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Fail(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GeoFetcher for RecordingFetcher {
    async fn fetch(&self, request: &QueryRequest) -> Result<Value, ConnectorError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Json(payload) => Ok(payload.clone()),
            Reply::Fail(message) => Err(ConnectorError::Decode(message.clone())),
        }
    }
}
