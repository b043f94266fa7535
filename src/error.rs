use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No async runtime: {0}")]
    Runtime(String),
}

impl From<toml::de::Error> for ScopeError {
    fn from(err: toml::de::Error) -> Self {
        ScopeError::Config(err.to_string())
    }
}

/// Result type for agentscope crate
pub type Result<T> = std::result::Result<T, ScopeError>;
