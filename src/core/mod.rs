// Public modules
pub mod config;
pub mod conversion;
pub mod error;
pub mod event;
pub mod github;
pub mod line_count;
pub mod metrics;
pub mod report;

// Internal modules - not part of public API
pub(crate) mod http;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
