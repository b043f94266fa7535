use std::fs;

use agentscope::analysis::EndpointCategory;
use agentscope::capture::AuthEventType;
use agentscope::export::{AuthExport, ExportFormat, RequestExport};
use agentscope::http::{ReqwestClient, Request};
use agentscope::storage::{KeyValueStorage, MemoryStorage};
use agentscope::{Scope, ScopeConfig};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scope_in(dir: &TempDir) -> Scope {
    let config = ScopeConfig {
        export_dir: dir.path().to_path_buf(),
        ..ScopeConfig::default().with_domain_filter("127.0.0.1")
    };
    Scope::new(config).unwrap()
}

fn files_with_prefix(dir: &TempDir, prefix: &str) -> Vec<std::path::PathBuf> {
    fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
        })
        .collect()
}

#[tokio::test]
async fn test_request_export_files() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secrets"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let scope = scope_in(&temp_dir);
    let client = scope.instrument(ReqwestClient::new().unwrap());
    client
        .fetch(Request::get(&format!("{}/v1/secrets?page=2", mock_server.uri())).unwrap())
        .await
        .unwrap();

    let document = scope.api().export(ExportFormat::Json);
    assert_eq!(document.summary.total, 1);
    assert_eq!(document.summary.by_endpoint[&EndpointCategory::SecretsList], 1);

    let written = files_with_prefix(&temp_dir, "agent-requests");
    assert_eq!(written.len(), 1);
    assert!(written[0].extension().is_some_and(|e| e == "json"));

    let loaded: RequestExport =
        serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(loaded.requests[0].response.as_ref().unwrap().status, 500);
    assert_eq!(loaded.summary.by_status_code[&500], 1);

    scope.api().export(ExportFormat::Csv);
    let csv = files_with_prefix(&temp_dir, "agent-requests")
        .into_iter()
        .find(|p| p.extension().is_some_and(|e| e == "csv"))
        .unwrap();
    let content = fs::read_to_string(csv).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("id,method,url,endpoint,status,duration_ms,timestamp,error")
    );
    assert!(lines.next().unwrap().contains(",GET,"));
}

#[tokio::test]
async fn test_auth_export_with_storage() {
    let temp_dir = TempDir::new().unwrap();
    let scope = scope_in(&temp_dir);
    let storage = scope.instrument_storage(MemoryStorage::default(), "localStorage");

    storage.set_item("devin_token", "tok_abcdefghijkl");
    storage.set_item("theme", "dark");
    assert_eq!(storage.get_item("devin_token").as_deref(), Some("tok_abcdefghijkl"));
    storage.remove_item("devin_token");

    let document = scope.auth().export();
    assert_eq!(document.summary.total, 3);
    assert_eq!(document.events[0].event_type, AuthEventType::StorageRemove);
    assert_eq!(document.events[2].value.as_deref(), Some("tok_...ijkl"));

    let written = files_with_prefix(&temp_dir, "agent-auth");
    assert_eq!(written.len(), 1);
    let loaded: AuthExport =
        serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(loaded.events.len(), 3);
}

#[test]
fn test_export_to_missing_directory_is_not_fatal() {
    let config = ScopeConfig {
        export_dir: "/nonexistent/agentscope/exports".into(),
        ..ScopeConfig::default()
    };
    let scope = Scope::new(config).unwrap();
    let document = scope.sessions().export();
    assert_eq!(document.summary.total, 0);
}
