pub mod classifier;
pub mod summary;

pub use classifier::{EndpointCategory, classify, session_id_from_url};
pub use summary::{
    AggregateSummary, AuthSummary, EndpointMetrics, SessionSummary, endpoint_metrics, summarize,
    summarize_auth, summarize_sessions,
};
