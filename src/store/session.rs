use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::capture::{Message, Session};
use crate::store::BoundedStore;

/// How an upsert treats existing details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsUpdate {
    /// Shallow-merge the patch over existing details (GET responses)
    Merge,
    /// Discard existing details (creation responses)
    Replace,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: BoundedStore<Session>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: BoundedStore::new(capacity),
        }
    }

    /// Update the session keyed by `session_id`, creating it when absent.
    ///
    /// `created_at` and messages of an existing session are kept.
    pub fn upsert(
        &mut self,
        session_id: &str,
        patch: Map<String, Value>,
        mode: DetailsUpdate,
        seen_at: DateTime<Utc>,
    ) {
        if self.sessions.find_by_id(session_id).is_none() {
            self.sessions.insert(Session::new(session_id, seen_at));
        }

        if let Some(session) = self.sessions.find_by_id_mut(session_id) {
            match mode {
                DetailsUpdate::Replace => session.details = patch,
                DetailsUpdate::Merge => session.details.extend(patch),
            }
            if let Some(status) = status_of(&session.details) {
                session.status = status;
            }
        }
    }

    /// Append a message, creating the session if it is not known yet
    pub fn push_message(&mut self, message: Message) {
        if self.sessions.find_by_id(&message.session_id).is_none() {
            self.sessions
                .insert(Session::new(&message.session_id, message.timestamp));
        }
        if let Some(session) = self.sessions.find_by_id_mut(&message.session_id) {
            session.messages.push(message);
        }
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.find_by_id(session_id)
    }

    /// Latest `created_at`, ties going to the most recently inserted
    pub fn current(&self) -> Option<&Session> {
        self.sessions.iter().rev().max_by_key(|s| s.created_at)
    }

    pub fn to_vec(&self) -> Vec<Session> {
        self.sessions.to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

/// Remote status field, `status_enum` preferred over `status`
fn status_of(details: &Map<String, Value>) -> Option<String> {
    details
        .get("status_enum")
        .or_else(|| details.get("status"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
