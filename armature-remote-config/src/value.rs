//! Resolved Values
//!
//! A [`ValueAccessor`] holds one resolved parameter value as the raw string
//! the backend sent, plus where it came from. Typed reads never fail: a
//! value that does not parse falls back to a fixed default.

use serde::{Deserialize, Serialize};

/// Tokens that read as `true` in [`ValueAccessor::as_boolean`] (compared lower-cased).
pub const TRUTHY_VALUES: [&str; 6] = ["1", "true", "t", "yes", "y", "on"];

/// Returned by [`ValueAccessor::as_boolean`] when the raw value is not truthy.
pub const DEFAULT_BOOLEAN: bool = false;

/// Returned by [`ValueAccessor::as_number`] when the raw value is not numeric.
pub const DEFAULT_NUMBER: f64 = 0.0;

/// Returned by [`ValueAccessor::as_string`] for values that were never set.
pub const DEFAULT_STRING: &str = "";

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Supplied by the caller's default config
    Default,
    /// Supplied by the template (conditional value or parameter default)
    Remote,
    /// Not present anywhere; the accessor holds the static default
    Static,
}

impl ValueSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Remote => "remote",
            Self::Static => "static",
        }
    }
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resolved config value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueAccessor {
    source: ValueSource,
    raw: String,
}

impl ValueAccessor {
    /// Create a value with the given provenance
    pub fn new(source: ValueSource, raw: impl Into<String>) -> Self {
        Self {
            source,
            raw: raw.into(),
        }
    }

    /// Value supplied by the template
    pub fn remote(raw: impl Into<String>) -> Self {
        Self::new(ValueSource::Remote, raw)
    }

    /// Value supplied by the caller's default config
    pub fn default_config(raw: impl Into<String>) -> Self {
        Self::new(ValueSource::Default, raw)
    }

    /// Value for a key that resolved to nothing
    pub fn static_default() -> Self {
        Self::new(ValueSource::Static, DEFAULT_STRING)
    }

    /// Read as a boolean.
    ///
    /// `true` only for `1`, `true`, `t`, `yes`, `y` and `on`, ignoring case.
    ///
    /// # Examples
    ///
    /// ```
    /// use armature_remote_config::ValueAccessor;
    ///
    /// assert!(ValueAccessor::remote("Yes").as_boolean());
    /// assert!(!ValueAccessor::remote("nope").as_boolean());
    /// ```
    pub fn as_boolean(&self) -> bool {
        let lowered = self.raw.to_lowercase();
        if TRUTHY_VALUES.contains(&lowered.as_str()) {
            true
        } else {
            DEFAULT_BOOLEAN
        }
    }

    /// Read as a number, `0` when the raw value is not numeric.
    pub fn as_number(&self) -> f64 {
        self.raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| !n.is_nan())
            .unwrap_or(DEFAULT_NUMBER)
    }

    /// Read as a string
    pub fn as_string(&self) -> &str {
        &self.raw
    }

    pub fn source(&self) -> ValueSource {
        self.source
    }
}

impl Default for ValueAccessor {
    fn default() -> Self {
        Self::static_default()
    }
}

impl std::fmt::Display for ValueAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Caller-supplied default config value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl DefaultValue {
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// The string form merged into a resolved config
    pub fn to_raw(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
        }
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Render a number the way backends send it: integral values without a
/// fractional part (`42`, not `42.0`).
pub(crate) fn format_number(value: f64) -> String {
    value.to_string()
}
