//! Captured traffic records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::Body;

/// Which interception path produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Awaited inline by the caller
    Fetch,
    /// Dispatched with a completion handle
    Xhr,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Fetch => "fetch",
            Transport::Xhr => "xhr",
        }
    }
}

/// Request payload as handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Text(String),
    Json(Value),
    /// Placeholder for binary bodies, holds the byte length
    Binary(usize),
}

impl From<&Body> for Payload {
    fn from(body: &Body) -> Self {
        match body {
            Body::Text(text) => Payload::Text(text.clone()),
            Body::Json(value) => Payload::Json(value.clone()),
            Body::Bytes(bytes) => Payload::Binary(bytes.len()),
        }
    }
}

impl Payload {
    /// Interpret the payload as JSON, parsing text bodies
    pub fn as_json(&self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value.clone()),
            Payload::Text(text) => serde_json::from_str(text).ok(),
            Payload::Binary(_) => None,
        }
    }
}

/// Lookup key for bounded stores
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    pub id: String,
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Payload>,
    pub timestamp: DateTime<Utc>,
    pub transport: Transport,
    pub response: Option<CapturedResponse>,
    pub error: Option<String>,
}

impl CapturedRequest {
    pub fn is_settled(&self) -> bool {
        self.response.is_some() || self.error.is_some()
    }
}

impl Identified for CapturedRequest {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedResponse {
    pub id: String,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventType {
    RequestHeader,
    StorageSet,
    StorageGet,
    StorageRemove,
}

impl AuthEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEventType::RequestHeader => "request_header",
            AuthEventType::StorageSet => "storage_set",
            AuthEventType::StorageGet => "storage_get",
            AuthEventType::StorageRemove => "storage_remove",
        }
    }
}

/// Credential sighting. `value` is already masked unless raw capture is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: AuthEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuthEvent {
    /// Header name or storage key the event refers to
    pub fn subject(&self) -> &str {
        self.header
            .as_deref()
            .or(self.key.as_deref())
            .unwrap_or_default()
    }
}

impl Identified for AuthEvent {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Client to service; the only leg visible from the client side
    Outgoing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub session_id: String,
    pub direction: Direction,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub request_data: Value,
}

/// A remote session as seen from the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub details: Map<String, Value>,
}

impl Session {
    pub fn new(id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            status: "unknown".to_string(),
            created_at,
            messages: Vec::new(),
            details: Map::new(),
        }
    }
}

impl Identified for Session {
    fn id(&self) -> &str {
        &self.id
    }
}
