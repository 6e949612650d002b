//! Evaluation Context
//!
//! Per-call client data that conditions are evaluated against.

use crate::value::format_number;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Custom signal value supplied by the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    String(String),
    Number(f64),
}

impl SignalValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

impl From<&str> for SignalValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SignalValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for SignalValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for SignalValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for SignalValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

/// Evaluation context
///
/// Holds the randomization id used by percent conditions and the custom
/// signals used by custom signal conditions. Looking up a signal that was
/// never set yields `None`.
///
/// # Examples
///
/// ```
/// use armature_remote_config::EvaluationContext;
///
/// let context = EvaluationContext::new()
///     .with_randomization_id("device-42")
///     .with_signal("app_version", "2.1.0")
///     .with_signal("session_count", 7);
///
/// assert_eq!(context.randomization_id(), Some("device-42"));
/// assert!(context.signal("country").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    randomization_id: Option<String>,
    signals: HashMap<String, SignalValue>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_randomization_id(mut self, id: impl Into<String>) -> Self {
        self.randomization_id = Some(id.into());
        self
    }

    pub fn with_signal(mut self, key: impl Into<String>, value: impl Into<SignalValue>) -> Self {
        self.signals.insert(key.into(), value.into());
        self
    }

    pub fn set_signal(&mut self, key: impl Into<String>, value: impl Into<SignalValue>) {
        self.signals.insert(key.into(), value.into());
    }

    /// The randomization id, treating an empty id as absent
    pub fn randomization_id(&self) -> Option<&str> {
        self.randomization_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn signal(&self, key: &str) -> Option<&SignalValue> {
        self.signals.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_randomization_id_is_absent() {
        let context = EvaluationContext::new().with_randomization_id("");
        assert_eq!(context.randomization_id(), None);
    }

    #[test]
    fn test_signal_lookup() {
        let mut context = EvaluationContext::new().with_signal("tier", "gold");
        context.set_signal("visits", 12);

        assert_eq!(context.signal("tier"), Some(&SignalValue::from("gold")));
        assert_eq!(context.signal("visits").and_then(|v| v.as_number()), Some(12.0));
        assert!(context.signal("missing").is_none());
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(SignalValue::from(3).to_string(), "3");
        assert_eq!(SignalValue::from(2.5).to_string(), "2.5");
        assert_eq!(SignalValue::from("x").to_string(), "x");
    }
}
