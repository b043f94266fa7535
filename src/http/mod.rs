pub mod client;
pub mod observed;
pub mod observer;
pub mod request;
pub mod response;
pub mod types;

// Re-export commonly used types for convenient access
pub use client::{HttpClient, ReqwestClient};
pub use observed::{InFlight, IntoObserved, ObservedClient, PendingCall};
pub use observer::{InterceptedCall, TrafficObserver};
pub use request::{Body, Request};
pub use response::Response;
pub use types::{Method, Status};
