use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Result, ScopeError};

/// Log verbosity accepted in `agentscope.toml`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Options shared by the interceptor and all monitors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Substring matched against the request host
    pub domain_filter: String,
    pub log_level: LogLevel,
    pub capture_response_bodies: bool,
    /// Store credentials unmasked. Unsafe, off by default.
    pub capture_raw_tokens: bool,
    pub max_stored_requests: usize,
    pub max_stored_auth_events: usize,
    pub max_stored_sessions: usize,
    /// Directory exported files are written to
    pub export_dir: PathBuf,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            domain_filter: "api.devin.ai".to_string(),
            log_level: LogLevel::Info,
            capture_response_bodies: true,
            capture_raw_tokens: false,
            max_stored_requests: 100,
            max_stored_auth_events: 100,
            max_stored_sessions: 20,
            export_dir: PathBuf::from("."),
        }
    }
}

impl ScopeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.domain_filter.trim().is_empty() {
            return Err(ScopeError::Config("domain_filter must not be empty".into()));
        }
        for (name, value) in [
            ("max_stored_requests", self.max_stored_requests),
            ("max_stored_auth_events", self.max_stored_auth_events),
            ("max_stored_sessions", self.max_stored_sessions),
        ] {
            if value == 0 {
                return Err(ScopeError::Config(format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }

    pub fn with_domain_filter(mut self, domain: &str) -> Self {
        self.domain_filter = domain.to_string();
        self
    }
}

/// Locates and parses `agentscope.toml`
pub struct ConfigLoader;

impl ConfigLoader {
    const CONFIG_FILE: &'static str = "agentscope.toml";

    /// Load and validate a config file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ScopeConfig> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ScopeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Search order:
    /// 1. current directory and its parents
    /// 2. ~/.config/agentscope/
    ///
    /// Falls back to defaults when nothing is found. A file that exists but
    /// fails to parse is an error.
    pub fn find_and_load() -> Result<ScopeConfig> {
        match Self::find_config_path() {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load_from_path(path)
            }
            None => Ok(ScopeConfig::default()),
        }
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Ok(mut current) = std::env::current_dir() {
            loop {
                let candidate = current.join(Self::CONFIG_FILE);
                if candidate.exists() {
                    return Some(candidate);
                }
                if !current.pop() {
                    break;
                }
            }
        }

        let user = dirs::home_dir()?
            .join(".config")
            .join("agentscope")
            .join(Self::CONFIG_FILE);
        user.exists().then_some(user)
    }
}
