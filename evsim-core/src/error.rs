//! Custom error types

use thiserror::Error;

/// Engine-level failures. Every variant is fatal to the pipeline invocation that
/// raised it; they travel inside `anyhow::Error` and can be recovered with
/// `downcast_ref::<Error>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Unknown catalog key or internally inconsistent vehicle configuration
    #[error("configuration error: {0}")]
    ConfigurationError(String),
    /// Malformed driving profile (empty, time running backwards, ragged columns)
    #[error("driving profile error: {0}")]
    ProfileError(String),
    #[error("`SerdeAPI` failed: {0}")]
    SerdeError(String),
}
