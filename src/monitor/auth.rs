use chrono::Utc;
use parking_lot::Mutex;

use crate::analysis::{self, AuthSummary};
use crate::capture::mask::{is_sensitive_header, mask_value};
use crate::capture::{AuthEvent, AuthEventType, generate_id};
use crate::config::ScopeConfig;
use crate::export::{AuthExport, Exporter};
use crate::http::{InterceptedCall, TrafficObserver};
use crate::store::BoundedStore;

/// Credential activity seen in request headers and key/value storage.
///
/// Values are masked on the way in; raw credentials are only retained when
/// `capture_raw_tokens` is set.
pub struct AuthMonitor {
    capture_raw_tokens: bool,
    events: Mutex<BoundedStore<AuthEvent>>,
    exporter: Exporter,
}

impl AuthMonitor {
    pub fn new(config: &ScopeConfig) -> Self {
        if config.capture_raw_tokens {
            tracing::warn!("Raw token capture is enabled; credentials will be stored unmasked");
        }
        Self {
            capture_raw_tokens: config.capture_raw_tokens,
            events: Mutex::new(BoundedStore::new(config.max_stored_auth_events)),
            exporter: Exporter::new(&config.export_dir),
        }
    }

    fn mask(&self, value: &str) -> String {
        mask_value(value, self.capture_raw_tokens)
    }

    fn push(&self, event: AuthEvent) {
        tracing::debug!("Auth event {} on {}", event.event_type.as_str(), event.subject());
        self.events.lock().insert(event);
    }

    pub fn record_header(&self, url: &str, method: &str, header: &str, value: &str) {
        self.push(AuthEvent {
            id: generate_id(),
            event_type: AuthEventType::RequestHeader,
            url: Some(url.to_string()),
            method: Some(method.to_string()),
            header: Some(header.to_string()),
            storage: None,
            key: None,
            value: Some(self.mask(value)),
            timestamp: Utc::now(),
        });
    }

    pub fn record_storage(
        &self,
        event_type: AuthEventType,
        storage: &str,
        key: &str,
        value: Option<&str>,
    ) {
        self.push(AuthEvent {
            id: generate_id(),
            event_type,
            url: None,
            method: None,
            header: None,
            storage: Some(storage.to_string()),
            key: Some(key.to_string()),
            value: value.map(|v| self.mask(v)),
            timestamp: Utc::now(),
        });
    }

    /// Most recent first
    pub fn get_events(&self) -> Vec<AuthEvent> {
        self.events.lock().to_vec()
    }

    pub fn summarize(&self) -> AuthSummary {
        analysis::summarize_auth(&self.get_events())
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn export(&self) -> AuthExport {
        let events = self.get_events();
        let document = AuthExport {
            summary: analysis::summarize_auth(&events),
            events,
            export_time: Utc::now(),
        };
        self.exporter.write_json("agent-auth", &document);
        document
    }
}

impl TrafficObserver for AuthMonitor {
    fn on_request(&self, call: &InterceptedCall) {
        let url = call.request.url.as_str();
        let method = call.request.method.as_str();
        for (name, value) in call.request.headers.iter() {
            if !is_sensitive_header(name.as_str()) {
                continue;
            }
            match value.to_str() {
                Ok(value) => self.record_header(url, method, name.as_str(), value),
                Err(e) => tracing::error!("Unreadable {} header: {}", name, e),
            }
        }
    }
}
