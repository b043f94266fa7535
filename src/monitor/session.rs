use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::analysis::{self, EndpointCategory, SessionSummary, classify, session_id_from_url};
use crate::capture::{Direction, Message, Payload, Session};
use crate::config::ScopeConfig;
use crate::export::{Exporter, SessionExport};
use crate::http::{InterceptedCall, Method, Response, TrafficObserver};
use crate::store::{DetailsUpdate, SessionStore};

/// Tracks remote sessions: creation, detail polls and outgoing messages
pub struct SessionMonitor {
    sessions: Mutex<SessionStore>,
    exporter: Exporter,
}

fn as_object(body: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", type_name(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl SessionMonitor {
    pub fn new(config: &ScopeConfig) -> Self {
        Self {
            sessions: Mutex::new(SessionStore::new(config.max_stored_sessions)),
            exporter: Exporter::new(&config.export_dir),
        }
    }

    /// Record a creation response body (`{"session_id": ..}`)
    pub fn record_created(&self, body: &str, seen_at: DateTime<Utc>) {
        let details = match as_object(body) {
            Ok(details) => details,
            Err(e) => {
                tracing::error!("Unreadable session creation response: {}", e);
                return;
            }
        };
        let Some(session_id) = details.get("session_id").and_then(Value::as_str) else {
            tracing::error!("Session creation response carries no session_id");
            return;
        };
        let session_id = session_id.to_string();

        tracing::info!("Session {} created", session_id);
        self.sessions
            .lock()
            .upsert(&session_id, details, DetailsUpdate::Replace, seen_at);
    }

    /// Merge a details response into the session named in the URL
    pub fn record_details(&self, url: &str, body: &str, seen_at: DateTime<Utc>) {
        let Some(session_id) = session_id_from_url(url) else {
            return;
        };
        match as_object(body) {
            Ok(details) => {
                tracing::debug!("Session {} details updated", session_id);
                self.sessions
                    .lock()
                    .upsert(&session_id, details, DetailsUpdate::Merge, seen_at);
            }
            Err(e) => tracing::error!("Unreadable details for session {}: {}", session_id, e),
        }
    }

    /// Record an outgoing message from a `/session/{id}/message` request body
    pub fn record_message(&self, url: &str, body: Option<&Payload>, sent_at: DateTime<Utc>) {
        let Some(session_id) = session_id_from_url(url) else {
            return;
        };
        let Some(request_data) = body.and_then(Payload::as_json) else {
            tracing::error!("Message to session {} has no JSON body", session_id);
            return;
        };
        let content = match request_data.get("message") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        tracing::info!("Message sent to session {}", session_id);
        self.sessions.lock().push_message(Message {
            session_id,
            direction: Direction::Outgoing,
            content,
            timestamp: sent_at,
            request_data,
        });
    }

    pub fn get_sessions(&self) -> Vec<Session> {
        self.sessions.lock().to_vec()
    }

    pub fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.lock().get(id).cloned()
    }

    /// Most recently created session
    pub fn get_current_session(&self) -> Option<Session> {
        self.sessions.lock().current().cloned()
    }

    /// Every message across sessions, oldest first
    pub fn get_messages(&self) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .sessions
            .lock()
            .iter()
            .flat_map(|s| s.messages.iter().cloned())
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        messages
    }

    /// Messages of one session, empty when the session is unknown
    pub fn get_session_messages(&self, id: &str) -> Vec<Message> {
        self.sessions
            .lock()
            .get(id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    pub fn summarize(&self) -> SessionSummary {
        analysis::summarize_sessions(&self.get_sessions())
    }

    pub fn clear(&self) {
        self.sessions.lock().clear();
    }

    pub fn export(&self) -> SessionExport {
        let sessions = self.get_sessions();
        let document = SessionExport {
            summary: analysis::summarize_sessions(&sessions),
            messages: self.get_messages(),
            sessions,
            export_time: Utc::now(),
        };
        self.exporter.write_json("agent-sessions", &document);
        document
    }
}

impl TrafficObserver for SessionMonitor {
    fn on_request(&self, call: &InterceptedCall) {
        let url = call.request.url.as_str();
        if call.request.method == Method::Post
            && classify(url, call.request.method.as_str()) == EndpointCategory::MessageSending
        {
            let payload = call.request.body.as_ref().map(Payload::from);
            self.record_message(url, payload.as_ref(), call.started_at);
        }
    }

    fn on_response(&self, call: &InterceptedCall, response: &Response, received_at: DateTime<Utc>) {
        if !response.is_success() {
            return;
        }
        let url = call.request.url.as_str();
        match (classify(url, call.request.method.as_str()), call.request.method) {
            (EndpointCategory::SessionCreation, Method::Post) => {
                self.record_created(&response.body, received_at)
            }
            (EndpointCategory::SessionDetails, Method::Get) => {
                self.record_details(url, &response.body, received_at)
            }
            _ => {}
        }
    }
}
