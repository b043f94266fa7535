use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::http::types::Method;
use crate::{Result, ScopeError};

/// Payload handed to the transport. Kept inspectable so observers can record it.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: url::Url,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl Request {
    pub fn new(method: &str, url: &str) -> Result<Self> {
        Ok(Self {
            method: method.parse()?,
            url: url::Url::parse(url.trim())?,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::new("GET", url)
    }

    pub fn post(url: &str) -> Result<Self> {
        Self::new("POST", url)
    }

    pub(crate) fn insert_header(&mut self, key: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ScopeError::ParseError(format!("Invalid header name {}: {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ScopeError::ParseError(format!("Invalid header value for {}: {}", key, e)))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self> {
        self.insert_header(key, value)?;
        Ok(self)
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.body = Some(Body::Text(text.to_owned()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        let value = serde_json::to_value(data)?;
        self.insert_header("Content-Type", "application/json")?;
        self.body = Some(Body::Json(value));
        Ok(self)
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(Body::Bytes(bytes));
        self
    }

    pub fn with_auth_bearer(self, token: &str) -> Result<Self> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Host portion of the target URL, empty for host-less URLs
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}
