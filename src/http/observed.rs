//! Observing decorator around an [`HttpClient`].
//!
//! Two call styles are supported. [`ObservedClient::fetch`] awaits the call
//! inline. [`ObservedClient::open`] + [`PendingCall::send`] dispatch the call
//! onto the runtime and hand back an [`InFlight`] completion handle; a
//! completion listener records the outcome before the caller sees it.
//! Either way the caller receives exactly what the inner client produced.
//!
//! An `ObservedClient` is not itself an [`HttpClient`], so it cannot end up
//! wrapped inside another one. Instrumenting an already observed client goes
//! through [`IntoObserved`] and extends the existing observer list.

use std::sync::Arc;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::capture::Transport;
use crate::http::client::HttpClient;
use crate::http::observer::{InterceptedCall, TrafficObserver};
use crate::http::request::{Body, Request};
use crate::http::response::Response;
use crate::http::types::Method;
use crate::{Result, ScopeError};

pub struct ObservedClient<C> {
    inner: Arc<C>,
    domain_filter: String,
    observers: Vec<Arc<dyn TrafficObserver>>,
}

impl<C> Clone for ObservedClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            domain_filter: self.domain_filter.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<C: HttpClient> ObservedClient<C> {
    pub fn new(inner: C, domain_filter: &str) -> Self {
        Self {
            inner: Arc::new(inner),
            domain_filter: domain_filter.to_lowercase(),
            observers: Vec::new(),
        }
    }

    /// Register `observer`. Registering the same observer twice is a no-op.
    pub fn add_observer(mut self, observer: Arc<dyn TrafficObserver>) -> Self {
        let already = self
            .observers
            .iter()
            .any(|o| Arc::as_ptr(o) as *const () == Arc::as_ptr(&observer) as *const ());
        if already {
            tracing::debug!("Observer already registered, skipping");
        } else {
            self.observers.push(observer);
        }
        self
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Plain substring containment on the host. Matches subdomains and
    /// unrelated hosts that happen to contain the filter.
    pub fn matches(&self, request: &Request) -> bool {
        request.host().to_lowercase().contains(&self.domain_filter)
    }

    /// Await the call inline, recording it when the host matches
    pub async fn fetch(&self, request: Request) -> Result<Response> {
        if !self.matches(&request) {
            return self.inner.execute(request).await;
        }

        let call = InterceptedCall::new(&request, Transport::Fetch);
        self.notify_request(&call);

        let outcome = self.inner.execute(request).await;
        self.notify_outcome(&call, &outcome);
        outcome
    }

    /// Start a dispatched call. Nothing is sent until [`PendingCall::send`].
    pub fn open(&self, method: Method, url: &str) -> Result<PendingCall<C>> {
        Ok(PendingCall {
            client: self.clone(),
            request: Request::new(method.as_str(), url)?,
        })
    }

    fn notify_request(&self, call: &InterceptedCall) {
        tracing::debug!(
            "Intercepted {} {} via {} ({})",
            call.request.method,
            call.request.url,
            call.transport.as_str(),
            call.id
        );
        for observer in &self.observers {
            observer.on_request(call);
        }
    }

    fn notify_outcome(&self, call: &InterceptedCall, outcome: &Result<Response>) {
        let now = Utc::now();
        match outcome {
            Ok(response) => {
                for observer in &self.observers {
                    observer.on_response(call, response, now);
                }
            }
            Err(error) => {
                for observer in &self.observers {
                    observer.on_error(call, error, now);
                }
            }
        }
    }
}

/// Conversion into an [`ObservedClient`].
///
/// A plain client gets a fresh wrapper; an observed client is returned as is,
/// keeping its domain filter and observers.
pub trait IntoObserved {
    type Client: HttpClient;

    fn into_observed(self, domain_filter: &str) -> ObservedClient<Self::Client>;
}

impl<C: HttpClient> IntoObserved for C {
    type Client = C;

    fn into_observed(self, domain_filter: &str) -> ObservedClient<C> {
        ObservedClient::new(self, domain_filter)
    }
}

impl<C: HttpClient> IntoObserved for ObservedClient<C> {
    type Client = C;

    fn into_observed(self, _domain_filter: &str) -> ObservedClient<C> {
        self
    }
}

/// A dispatched call that has been opened but not sent
pub struct PendingCall<C> {
    client: ObservedClient<C>,
    request: Request,
}

impl<C: HttpClient> PendingCall<C> {
    pub fn header(mut self, key: &str, value: &str) -> Result<Self> {
        self.request.insert_header(key, value)?;
        Ok(self)
    }

    /// Dispatch the call onto the current tokio runtime.
    ///
    /// Fails without recording anything when no runtime is running.
    pub fn send(self, body: Option<Body>) -> Result<InFlight> {
        let runtime = Handle::try_current().map_err(|e| ScopeError::Runtime(e.to_string()))?;
        let PendingCall { client, mut request } = self;
        request.body = body;

        let call = client
            .matches(&request)
            .then(|| InterceptedCall::new(&request, Transport::Xhr));
        if let Some(call) = &call {
            client.notify_request(call);
        }
        let id = call.as_ref().map(|c| c.id.clone());

        let (tx, rx) = oneshot::channel();
        runtime.spawn(async move {
            let outcome = client.inner.execute(request).await;
            // load / error listener
            if let Some(call) = &call {
                client.notify_outcome(call, &outcome);
            }
            let _ = tx.send(outcome);
        });

        Ok(InFlight { id, rx })
    }
}

/// Completion handle for a dispatched call
pub struct InFlight {
    id: Option<String>,
    rx: oneshot::Receiver<Result<Response>>,
}

impl InFlight {
    /// Correlation id, `None` when the host was not observed
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Wait for the completion event
    pub async fn wait(self) -> Result<Response> {
        self.rx.await.map_err(|_| {
            ScopeError::NetworkError("dispatched call ended without completing".to_string())
        })?
    }
}
