use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic label for an agent API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EndpointCategory {
    SessionCreation,
    SessionDetails,
    MessageSending,
    SecretsList,
    SecretManagement,
    FileUpload,
    Other,
}

impl EndpointCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointCategory::SessionCreation => "SessionCreation",
            EndpointCategory::SessionDetails => "SessionDetails",
            EndpointCategory::MessageSending => "MessageSending",
            EndpointCategory::SecretsList => "SecretsList",
            EndpointCategory::SecretManagement => "SecretManagement",
            EndpointCategory::FileUpload => "FileUpload",
            EndpointCategory::Other => "Other",
        }
    }
}

impl fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of an absolute URL, or the raw input without query/fragment
fn path_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Classify a call. First matching rule wins.
///
/// `/session/{id}/message` must be tested before the bare `/session/`
/// rule, since every message URL is also a session-details URL.
pub fn classify(url: &str, _method: &str) -> EndpointCategory {
    let path = path_of(url);
    let path = path.trim_end_matches('/');

    if path.ends_with("/sessions") {
        EndpointCategory::SessionCreation
    } else if path.contains("/session/") && path.ends_with("/message") {
        EndpointCategory::MessageSending
    } else if path.contains("/session/") {
        EndpointCategory::SessionDetails
    } else if path == "/secrets" || path.ends_with("/secrets") {
        EndpointCategory::SecretsList
    } else if path.contains("/secrets/") {
        EndpointCategory::SecretManagement
    } else if path.ends_with("/attachments") {
        EndpointCategory::FileUpload
    } else {
        EndpointCategory::Other
    }
}

/// Session id from a `/session/{id}` path segment
pub fn session_id_from_url(url: &str) -> Option<String> {
    let path = path_of(url);
    let mut segments = path.split('/');
    segments.find(|segment| *segment == "session")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
