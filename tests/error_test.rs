use std::fs;
use std::time::Duration;

use agentscope::config::ConfigLoader;
use agentscope::http::{Method, ReqwestClient, Request, Response};
use agentscope::{Scope, ScopeConfig, ScopeError};
use reqwest::header::HeaderMap;
use tempfile::TempDir;

#[test]
fn test_unknown_method_is_a_parse_error() {
    let err = "FETCH".parse::<Method>().unwrap_err();
    assert!(matches!(err, ScopeError::ParseError(_)));
    assert!(err.to_string().starts_with("Parse error: "));
}

#[test]
fn test_bad_url_is_a_url_parse_error() {
    let err = Request::get("not a url").unwrap_err();
    assert!(matches!(err, ScopeError::UrlParseError(_)));
    assert!(err.to_string().starts_with("URL parse error: "));
}

#[test]
fn test_non_json_body_is_a_json_error() {
    let response = Response::new(200, HeaderMap::new(), "<html>".to_string(), Duration::ZERO).unwrap();
    assert!(matches!(response.json(), Err(ScopeError::JsonError(_))));
}

#[test]
fn test_config_errors() {
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("missing.toml");
    assert!(matches!(
        ConfigLoader::load_from_path(&missing),
        Err(ScopeError::IoError(_))
    ));

    let broken = temp_dir.path().join("agentscope.toml");
    fs::write(&broken, "max_stored_requests = \"lots\"").unwrap();
    let err = ConfigLoader::load_from_path(&broken).unwrap_err();
    assert!(err.to_string().starts_with("Invalid configuration: "));

    let config = ScopeConfig {
        max_stored_sessions: 0,
        ..ScopeConfig::default()
    };
    match Scope::new(config) {
        Err(ScopeError::Config(msg)) => assert_eq!(msg, "max_stored_sessions must be at least 1"),
        _ => panic!("expected a configuration error"),
    }
}

/// Dispatching needs a runtime; without one the call is refused, not aborted
#[test]
fn test_dispatch_without_runtime() {
    let scope = Scope::new(ScopeConfig::default()).unwrap();
    let client = scope.instrument(ReqwestClient::new().unwrap());

    let result = client
        .open(Method::Get, "https://api.devin.ai/v1/sessions")
        .unwrap()
        .send(None);

    match result {
        Err(ScopeError::Runtime(_)) => {}
        _ => panic!("expected a runtime error"),
    }
    assert!(scope.api().is_empty());
}
