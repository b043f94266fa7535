use chrono::{DateTime, Utc};

use crate::ScopeError;
use crate::capture::{Transport, generate_id};
use crate::http::request::Request;
use crate::http::response::Response;

/// A call the interceptor decided to observe
#[derive(Debug, Clone)]
pub struct InterceptedCall {
    /// Correlation id shared by the request and its outcome
    pub id: String,
    pub request: Request,
    pub transport: Transport,
    pub started_at: DateTime<Utc>,
}

impl InterceptedCall {
    pub fn new(request: &Request, transport: Transport) -> Self {
        Self {
            id: generate_id(),
            request: request.clone(),
            transport,
            started_at: Utc::now(),
        }
    }
}

/// Receives intercepted traffic.
///
/// Implementations must not panic and must swallow their own failures:
/// the caller of the instrumented client never sees observer errors.
pub trait TrafficObserver: Send + Sync {
    fn on_request(&self, call: &InterceptedCall);

    fn on_response(&self, _call: &InterceptedCall, _response: &Response, _received_at: DateTime<Utc>) {
    }

    fn on_error(&self, _call: &InterceptedCall, _error: &ScopeError, _failed_at: DateTime<Utc>) {}
}
