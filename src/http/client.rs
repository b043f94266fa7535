use std::future::Future;
use std::time::{Duration, Instant};

use crate::Result;
use crate::http::request::{Body, Request};
use crate::http::response::Response;

/// Transport seam. Anything that can turn a [`Request`] into a [`Response`].
pub trait HttpClient: Send + Sync + 'static {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
        })
    }

    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl HttpClient for ReqwestClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.into(), request.url.as_str())
            .headers(request.headers);

        req = match request.body {
            Some(Body::Text(text)) => req.body(text),
            Some(Body::Json(value)) => req.body(serde_json::to_vec(&value)?),
            Some(Body::Bytes(bytes)) => req.body(bytes),
            None => req,
        };

        let start = Instant::now();
        let response = req.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        let duration = start.elapsed();

        let reason = status.canonical_reason().unwrap_or("Unknown");
        Ok(Response::new(status.as_u16(), headers, body, duration)?.with_status_text(reason))
    }
}
