//! Error types shared by the query core and the transport layer.

use serde_json::Value;
use thiserror::Error;

/// Coarse classification of a failed request.
///
/// Every [`ConnectorError`] falls into exactly one of these, and the
/// transport layer picks its status code from the kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid caller input; detected before any outbound call.
    ClientInput,
    /// The remote service reported an error or omitted an expected collection.
    Service,
    /// A valid request that produced no result.
    NotFound,
    /// Network failure, malformed JSON or anything else unexpected.
    Transport,
}

/// Errors produced while handling one tool invocation.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("remote service error: {}", remote_message(.0))]
    Remote(Value),
    #[error("{0}")]
    MissingCollection(String),
    #[error("{0}")]
    NotFound(String),
    #[error("request to remote service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote service returned invalid JSON: {0}")]
    Decode(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl ConnectorError {
    /// Shorthand for the "`<field>` required" input error.
    pub fn required(field: &str) -> Self {
        ConnectorError::InvalidInput(format!("{} required", field))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::InvalidInput(_) | ConnectorError::UnknownAction(_) => {
                ErrorKind::ClientInput
            }
            ConnectorError::Remote(_) | ConnectorError::MissingCollection(_) => ErrorKind::Service,
            ConnectorError::NotFound(_) => ErrorKind::NotFound,
            ConnectorError::Transport(_) | ConnectorError::Decode(_) => ErrorKind::Transport,
        }
    }
}

/// Best-effort human readable text for a remote `error` member.
fn remote_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let message = obj.get("message").and_then(Value::as_str);
            let code = obj.get("code").and_then(Value::as_i64);
            match (code, message) {
                (Some(code), Some(message)) => format!("{} ({})", message, code),
                (None, Some(message)) => message.to_string(),
                _ => error.to_string(),
            }
        }
        other => other.to_string(),
    }
}
