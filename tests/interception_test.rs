use std::net::TcpListener;
use std::time::Duration;

use agentscope::capture::{Payload, Transport};
use agentscope::http::{HttpClient, Method, ReqwestClient, Request, Response};
use agentscope::{Scope, ScopeConfig, ScopeError};
use reqwest::header::HeaderMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scope_for(domain: &str) -> Scope {
    Scope::new(ScopeConfig::default().with_domain_filter(domain)).unwrap()
}

/// Transport that always fails the same way
struct FailingClient;

impl HttpClient for FailingClient {
    async fn execute(&self, _request: Request) -> agentscope::Result<Response> {
        Err(ScopeError::NetworkError("connection refused".to_string()))
    }
}

/// Transport that answers every call with an empty JSON object
struct OkClient;

impl HttpClient for OkClient {
    async fn execute(&self, _request: Request) -> agentscope::Result<Response> {
        Response::new(200, HeaderMap::new(), "{}".to_string(), Duration::ZERO)
    }
}

fn closed_port_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, path)
}

/// Non-matching hosts pass straight through without being recorded
#[tokio::test]
async fn test_unobserved_domain_is_untouched() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
        .mount(&mock_server)
        .await;

    let scope = scope_for("api.devin.ai");
    let client = scope.instrument(ReqwestClient::new().unwrap());

    let url = format!("{}/v1/sessions", mock_server.uri());
    let response = client.fetch(Request::get(&url).unwrap()).await.unwrap();

    assert_eq!(response.status.code(), 200);
    assert_eq!(response.body, "plain");
    assert!(scope.api().is_empty());
    assert!(scope.auth().get_events().is_empty());
}

/// A rejected call is recorded and the caller still sees the original error
#[tokio::test]
async fn test_failure_is_recorded_and_propagated() {
    let scope = scope_for("api.devin.ai");
    let client = scope.instrument(FailingClient);

    let result = client
        .fetch(Request::get("https://api.devin.ai/v1/sessions").unwrap())
        .await;

    match result {
        Err(ScopeError::NetworkError(msg)) => assert_eq!(msg, "connection refused"),
        other => panic!("expected the inner error, got {:?}", other.map(|r| r.status)),
    }

    let requests = scope.api().get_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].response.is_none());
    assert_eq!(
        requests[0].error.as_deref(),
        Some("Network error: connection refused")
    );
}

#[tokio::test]
async fn test_real_network_failure() {
    let scope = scope_for("127.0.0.1");
    let client = scope.instrument(ReqwestClient::new().unwrap());

    let result = client
        .fetch(Request::get(&closed_port_url("/v1/sessions")).unwrap())
        .await;

    assert!(matches!(result, Err(ScopeError::HttpError(_))));
    let captured = &scope.api().get_requests()[0];
    assert!(captured.error.is_some());
    assert!(captured.response.is_none());
}

#[tokio::test]
async fn test_instrumenting_twice_records_once() {
    let scope = scope_for("api.devin.ai");
    let client = scope.instrument(scope.instrument(OkClient));
    assert_eq!(client.observer_count(), 3);

    let client = client.add_observer(scope.api().clone());
    assert_eq!(client.observer_count(), 3);

    client
        .fetch(
            Request::post("https://api.devin.ai/v1/session/s1/message")
                .unwrap()
                .with_json(&serde_json::json!({"message": "hello"}))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(scope.api().summarize().total, 1);
    assert_eq!(scope.sessions().get_session_messages("s1").len(), 1);
}

/// Scenario: create a session, message it, poll it
#[tokio::test]
async fn test_session_flow() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "devin-1",
            "url": "https://app.devin.ai/sessions/devin-1"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/session/devin-1/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/session/devin-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status_enum": "working",
            "title": "Fix flaky test"
        })))
        .mount(&mock_server)
        .await;

    let scope = scope_for("127.0.0.1");
    let client = scope.instrument(ReqwestClient::new().unwrap());
    let base = format!("{}/v1", mock_server.uri());

    let created = client
        .fetch(
            Request::post(&format!("{base}/sessions"))
                .unwrap()
                .with_auth_bearer("abcdef123456")
                .unwrap()
                .with_json(&serde_json::json!({"prompt": "fix the flaky test"}))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.json().unwrap()["session_id"], "devin-1");

    client
        .fetch(
            Request::post(&format!("{base}/session/devin-1/message"))
                .unwrap()
                .with_json(&serde_json::json!({"message": "any progress?"}))
                .unwrap(),
        )
        .await
        .unwrap();
    client
        .fetch(Request::get(&format!("{base}/session/devin-1")).unwrap())
        .await
        .unwrap();

    // request log, newest first
    let requests = scope.api().get_requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.transport == Transport::Fetch));
    let creation = &requests[2];
    assert_eq!(creation.headers["authorization"], "Bearer abcd...3456");
    assert_eq!(
        creation.body,
        Some(Payload::Json(serde_json::json!({"prompt": "fix the flaky test"})))
    );

    let summary = scope.api().summarize();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.by_status_code[&200], 3);
    assert_eq!(summary.by_method["POST"], 2);

    // sessions
    let session = scope.sessions().get_current_session().unwrap();
    assert_eq!(session.id, "devin-1");
    assert_eq!(session.status, "working");
    assert_eq!(session.details["url"], "https://app.devin.ai/sessions/devin-1");
    assert_eq!(session.details["title"], "Fix flaky test");
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.messages[0].content, "any progress?");

    // auth
    let events = scope.auth().get_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].header.as_deref(), Some("authorization"));
    assert_eq!(events[0].value.as_deref(), Some("Bearer abcd...3456"));
}

#[tokio::test]
async fn test_dispatched_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/secrets/sec-1"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("missing")
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&mock_server)
        .await;

    let scope = scope_for("127.0.0.1");
    let client = scope.instrument(ReqwestClient::new().unwrap());

    let in_flight = client
        .open(Method::Delete, &format!("{}/v1/secrets/sec-1", mock_server.uri()))
        .unwrap()
        .header("x-api-key", "key-0123456789")
        .unwrap()
        .send(None)
        .unwrap();
    let id = in_flight.id().unwrap().to_string();

    // recorded at send time, before completion
    let pending = scope.api().get_request(&id).unwrap();
    assert_eq!(pending.transport, Transport::Xhr);
    assert_eq!(pending.headers["x-api-key"], "key-...6789");

    let response = in_flight.wait().await.unwrap();
    assert_eq!(response.status.code(), 404);
    assert_eq!(response.body, "missing");

    let analysis = scope.api().analyze(&id);
    let report = analysis.report().unwrap();
    assert_eq!(report.endpoint.as_str(), "SecretManagement");
    assert_eq!(report.response.as_ref().unwrap().status, 404);
    assert!(report.timing.duration.unwrap() >= 50);
}

#[tokio::test]
async fn test_dispatched_failure_reaches_caller() {
    let scope = scope_for("api.devin.ai");
    let client = scope.instrument(FailingClient);

    let in_flight = client
        .open(Method::Get, "https://api.devin.ai/v1/secrets")
        .unwrap()
        .send(None)
        .unwrap();
    let id = in_flight.id().unwrap().to_string();

    assert!(matches!(
        in_flight.wait().await,
        Err(ScopeError::NetworkError(_))
    ));
    assert!(scope.api().get_request(&id).unwrap().error.is_some());
}

#[tokio::test]
async fn test_response_body_capture_disabled() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secrets"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[\"s1\"]"))
        .mount(&mock_server)
        .await;

    let config = ScopeConfig {
        capture_response_bodies: false,
        ..ScopeConfig::default().with_domain_filter("127.0.0.1")
    };
    let scope = Scope::new(config).unwrap();
    let client = scope.instrument(ReqwestClient::new().unwrap());

    let response = client
        .fetch(Request::get(&format!("{}/v1/secrets", mock_server.uri())).unwrap())
        .await
        .unwrap();

    // the caller still gets the real body
    assert_eq!(response.body, "[\"s1\"]");
    let captured = scope.api().get_requests()[0].response.clone().unwrap();
    assert_eq!(captured.body, "[response body capture disabled]");
}
