//! Error types for remote config templates

use thiserror::Error;

/// Result type for remote config operations
pub type RemoteConfigResult<T> = Result<T, RemoteConfigError>;

/// Remote config errors
///
/// Malformed conditions and failed value coercions are not errors: they
/// evaluate to `false` or to the documented accessor default.
#[derive(Debug, Error)]
pub enum RemoteConfigError {
    /// `evaluate()` was called before a template was set or loaded
    #[error("No template is cached. Call load() or set() before evaluate()")]
    NotLoaded,

    /// `load()` was called on a template without a source
    #[error("No template source is configured")]
    NoSource,

    /// The template source failed to produce a template
    #[error("Failed to fetch template: {0}")]
    Fetch(String),

    /// Two conditions in one template share a name
    #[error("Duplicate condition name in template: {0}")]
    DuplicateCondition(String),

    /// Rendering a resolved config failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteConfigError {
    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        Self::Fetch(msg.into())
    }

    /// Check if this error means no template has been cached yet
    pub fn is_not_loaded(&self) -> bool {
        matches!(self, Self::NotLoaded)
    }
}
