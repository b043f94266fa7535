use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::classifier::{EndpointCategory, classify};
use crate::capture::{AuthEvent, AuthEventType, CapturedRequest, Session};

/// Aggregate view over the request store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total: usize,
    pub by_endpoint: BTreeMap<EndpointCategory, usize>,
    pub by_method: BTreeMap<String, usize>,
    /// Only requests that received a response
    pub by_status_code: BTreeMap<u16, usize>,
    /// Mean over responded requests, 0 when there are none
    pub average_duration_ms: f64,
}

/// Outcome counters for one endpoint category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetrics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub pending: usize,
    pub average_duration_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSummary {
    pub total: usize,
    pub by_type: BTreeMap<AuthEventType, usize>,
    /// Keyed by header name or storage key
    pub by_key: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total: usize,
    pub messages: usize,
    pub by_status: BTreeMap<String, usize>,
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

pub fn summarize(requests: &[CapturedRequest]) -> AggregateSummary {
    let mut summary = AggregateSummary {
        total: requests.len(),
        ..AggregateSummary::default()
    };
    let mut duration_total = 0u64;
    let mut responded = 0usize;

    for request in requests {
        *summary
            .by_endpoint
            .entry(classify(&request.url, &request.method))
            .or_default() += 1;
        *summary.by_method.entry(request.method.clone()).or_default() += 1;

        if let Some(response) = &request.response {
            *summary.by_status_code.entry(response.status).or_default() += 1;
            duration_total += response.duration_ms;
            responded += 1;
        }
    }

    summary.average_duration_ms = mean(duration_total, responded);
    summary
}

/// Per-category success/failure breakdown. 2xx counts as success; any other
/// status or a transport error counts as failure.
pub fn endpoint_metrics(requests: &[CapturedRequest]) -> BTreeMap<EndpointCategory, EndpointMetrics> {
    let mut durations: BTreeMap<EndpointCategory, (u64, usize)> = BTreeMap::new();
    let mut metrics: BTreeMap<EndpointCategory, EndpointMetrics> = BTreeMap::new();

    for request in requests {
        let category = classify(&request.url, &request.method);
        let entry = metrics.entry(category).or_default();
        entry.total += 1;

        match (&request.response, &request.error) {
            (Some(response), _) => {
                if (200..300).contains(&response.status) {
                    entry.successful += 1;
                } else {
                    entry.failed += 1;
                }
                let (sum, count) = durations.entry(category).or_default();
                *sum += response.duration_ms;
                *count += 1;
            }
            (None, Some(_)) => entry.failed += 1,
            (None, None) => entry.pending += 1,
        }
    }

    for (category, (sum, count)) in durations {
        if let Some(entry) = metrics.get_mut(&category) {
            entry.average_duration_ms = mean(sum, count);
        }
    }
    metrics
}

pub fn summarize_auth(events: &[AuthEvent]) -> AuthSummary {
    let mut summary = AuthSummary {
        total: events.len(),
        ..AuthSummary::default()
    };
    for event in events {
        *summary.by_type.entry(event.event_type).or_default() += 1;
        *summary.by_key.entry(event.subject().to_string()).or_default() += 1;
    }
    summary
}

pub fn summarize_sessions(sessions: &[Session]) -> SessionSummary {
    let mut summary = SessionSummary {
        total: sessions.len(),
        ..SessionSummary::default()
    };
    for session in sessions {
        summary.messages += session.messages.len();
        *summary.by_status.entry(session.status.clone()).or_default() += 1;
    }
    summary
}
