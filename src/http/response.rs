use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::Result;
use crate::http::types::Status;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
    pub duration: Duration,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: String, duration: Duration) -> Result<Self> {
        let status = Status::new(status)?;
        Ok(Self {
            status_text: status.reason_phrase().to_string(),
            status,
            headers,
            body,
            duration,
        })
    }

    pub fn with_status_text(mut self, text: &str) -> Self {
        self.status_text = text.to_string();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
