pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod logger;
pub mod monitor;
pub mod storage;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::ScopeConfig;
pub use error::{Result, ScopeError};
pub use monitor::Scope;
