use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::ScopeError;
use crate::analysis::{self, AggregateSummary, EndpointCategory, EndpointMetrics, classify};
use crate::capture::mask::sanitize_headers;
use crate::capture::{self, CapturedRequest, CapturedResponse, Payload};
use crate::config::ScopeConfig;
use crate::export::{ExportFormat, Exporter, RequestExport};
use crate::http::{InterceptedCall, Response, TrafficObserver};
use crate::store::BoundedStore;

pub const BODY_CAPTURE_DISABLED: &str = "[response body capture disabled]";
pub const REQUEST_NOT_FOUND: &str = "Request not found";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Milliseconds, present once a response arrived
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub request: CapturedRequest,
    pub response: Option<CapturedResponse>,
    pub error: Option<String>,
    pub endpoint: EndpointCategory,
    pub timing: Timing,
}

/// Result of [`ApiMonitor::analyze`]. Unknown ids are a value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestAnalysis {
    Found(Box<AnalysisReport>),
    NotFound { error: String },
}

impl RequestAnalysis {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            RequestAnalysis::Found(report) => Some(report),
            RequestAnalysis::NotFound { .. } => None,
        }
    }
}

/// Request/response log for the observed domain
pub struct ApiMonitor {
    capture_response_bodies: bool,
    capture_raw_tokens: bool,
    requests: Mutex<BoundedStore<CapturedRequest>>,
    exporter: Exporter,
}

impl ApiMonitor {
    pub fn new(config: &ScopeConfig) -> Self {
        Self {
            capture_response_bodies: config.capture_response_bodies,
            capture_raw_tokens: config.capture_raw_tokens,
            requests: Mutex::new(BoundedStore::new(config.max_stored_requests)),
            exporter: Exporter::new(&config.export_dir),
        }
    }

    pub fn insert(&self, request: CapturedRequest) {
        tracing::info!(
            "{} {} [{}]",
            request.method,
            request.url,
            classify(&request.url, &request.method)
        );
        self.requests.lock().insert(request);
    }

    /// Returns `false` on a correlation miss, which is only logged at debug
    pub fn attach_response(&self, id: &str, response: CapturedResponse) -> bool {
        let (status, status_text, duration_ms) =
            (response.status, response.status_text.clone(), response.duration_ms);
        if !capture::attach_response(&mut self.requests.lock(), id, response) {
            return false;
        }

        if (200..300).contains(&status) {
            tracing::info!("{} -> {} in {}ms", id, status, duration_ms);
        } else {
            tracing::warn!("{} -> {} {} in {}ms", id, status, status_text, duration_ms);
        }
        true
    }

    pub fn attach_error(&self, id: &str, error: String) -> bool {
        let message = error.clone();
        if !capture::attach_error(&mut self.requests.lock(), id, error) {
            return false;
        }
        tracing::error!("{} failed: {}", id, message);
        true
    }

    /// Most recent first
    pub fn get_requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().to_vec()
    }

    pub fn get_request(&self, id: &str) -> Option<CapturedRequest> {
        self.requests.lock().find_by_id(id).cloned()
    }

    pub fn analyze(&self, id: &str) -> RequestAnalysis {
        let Some(request) = self.get_request(id) else {
            return RequestAnalysis::NotFound {
                error: REQUEST_NOT_FOUND.to_string(),
            };
        };

        let timing = Timing {
            start: request.timestamp,
            end: request.response.as_ref().map(|r| r.timestamp),
            duration: request.response.as_ref().map(|r| r.duration_ms),
        };
        RequestAnalysis::Found(Box::new(AnalysisReport {
            endpoint: classify(&request.url, &request.method),
            response: request.response.clone(),
            error: request.error.clone(),
            request,
            timing,
        }))
    }

    pub fn summarize(&self) -> AggregateSummary {
        analysis::summarize(&self.get_requests())
    }

    pub fn endpoint_metrics(&self) -> BTreeMap<EndpointCategory, EndpointMetrics> {
        analysis::endpoint_metrics(&self.get_requests())
    }

    pub fn clear(&self) {
        self.requests.lock().clear();
        tracing::info!("Request log cleared");
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    /// Build the export document and write it to the export directory
    pub fn export(&self, format: ExportFormat) -> RequestExport {
        let requests = self.get_requests();
        let document = RequestExport {
            summary: analysis::summarize(&requests),
            requests,
            export_time: Utc::now(),
        };
        match format {
            ExportFormat::Json => self.exporter.write_json("agent-requests", &document),
            ExportFormat::Csv => self.exporter.write_csv("agent-requests", &document.requests),
        };
        document
    }
}

impl TrafficObserver for ApiMonitor {
    fn on_request(&self, call: &InterceptedCall) {
        self.insert(CapturedRequest {
            id: call.id.clone(),
            url: call.request.url.to_string(),
            method: call.request.method.to_string(),
            headers: sanitize_headers(&call.request.headers, self.capture_raw_tokens),
            body: call.request.body.as_ref().map(Payload::from),
            timestamp: call.started_at,
            transport: call.transport,
            response: None,
            error: None,
        });
    }

    fn on_response(&self, call: &InterceptedCall, response: &Response, received_at: DateTime<Utc>) {
        let body = if self.capture_response_bodies {
            response.body.clone()
        } else {
            BODY_CAPTURE_DISABLED.to_string()
        };
        let duration_ms = (received_at - call.started_at).num_milliseconds().max(0) as u64;

        self.attach_response(
            &call.id,
            CapturedResponse {
                id: call.id.clone(),
                status: response.status.code(),
                status_text: response.status_text.clone(),
                headers: sanitize_headers(&response.headers, self.capture_raw_tokens),
                body,
                timestamp: received_at,
                duration_ms,
            },
        );
    }

    fn on_error(&self, call: &InterceptedCall, error: &ScopeError, _failed_at: DateTime<Utc>) {
        self.attach_error(&call.id, error.to_string());
    }
}
