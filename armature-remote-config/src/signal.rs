//! Custom Signal Comparison
//!
//! Compares a signal from the evaluation context against a condition's
//! target values. Anything malformed (unknown operator, missing signal,
//! unparseable number or version) is a non-match, never an error.

use crate::context::{EvaluationContext, SignalValue};
use crate::template::{CustomSignalCondition, SignalOperator};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

/// Longest semantic version accepted, in dot-separated segments.
pub const MAX_SEMANTIC_VERSION_SEGMENTS: usize = 5;

/// Compiled patterns kept before the regex cache is flushed.
const MAX_CACHED_PATTERNS: usize = 1024;

/// Regex targets compiled so far; `None` marks an invalid pattern.
static REGEX_CACHE: Lazy<RwLock<HashMap<String, Option<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Typed comparison of custom signals
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalComparator;

impl SignalComparator {
    /// Evaluate a custom signal condition
    pub fn evaluate(condition: &CustomSignalCondition, context: &EvaluationContext) -> bool {
        Self::compare(
            condition.operator,
            &condition.signal_key,
            &condition.target_values,
            context,
        )
    }

    /// Compare the signal under `signal_key` against `target_values`.
    ///
    /// String operators match if any target matches. Numeric and semantic
    /// version operators use only the first target.
    pub fn compare(
        operator: SignalOperator,
        signal_key: &str,
        target_values: &[String],
        context: &EvaluationContext,
    ) -> bool {
        if signal_key.is_empty() || target_values.is_empty() {
            return false;
        }
        let Some(actual) = context.signal(signal_key) else {
            trace!(signal_key = %signal_key, "Signal not present in context");
            return false;
        };

        match operator {
            SignalOperator::StringContains => {
                Self::any_target(target_values, actual, |target, actual| {
                    actual.contains(target)
                })
            }
            SignalOperator::StringDoesNotContain => {
                Self::any_target(target_values, actual, |target, actual| {
                    !actual.contains(target)
                })
            }
            SignalOperator::StringExactlyMatches => {
                Self::any_target(target_values, actual, |target, actual| {
                    target.trim() == actual.trim()
                })
            }
            SignalOperator::StringContainsRegex => {
                Self::any_target(target_values, actual, |target, actual| {
                    compiled_regex(target).is_some_and(|re| re.is_match(actual))
                })
            }
            SignalOperator::NumericLessThan => {
                Self::compare_numbers(actual, &target_values[0], Ordering::is_lt)
            }
            SignalOperator::NumericLessEqual => {
                Self::compare_numbers(actual, &target_values[0], Ordering::is_le)
            }
            SignalOperator::NumericEqual => {
                Self::compare_numbers(actual, &target_values[0], Ordering::is_eq)
            }
            SignalOperator::NumericNotEqual => {
                Self::compare_numbers(actual, &target_values[0], Ordering::is_ne)
            }
            SignalOperator::NumericGreaterThan => {
                Self::compare_numbers(actual, &target_values[0], Ordering::is_gt)
            }
            SignalOperator::NumericGreaterEqual => {
                Self::compare_numbers(actual, &target_values[0], Ordering::is_ge)
            }
            SignalOperator::SemanticVersionLessThan => {
                Self::compare_versions(actual, &target_values[0], Ordering::is_lt)
            }
            SignalOperator::SemanticVersionLessEqual => {
                Self::compare_versions(actual, &target_values[0], Ordering::is_le)
            }
            SignalOperator::SemanticVersionEqual => {
                Self::compare_versions(actual, &target_values[0], Ordering::is_eq)
            }
            SignalOperator::SemanticVersionNotEqual => {
                Self::compare_versions(actual, &target_values[0], Ordering::is_ne)
            }
            SignalOperator::SemanticVersionGreaterThan => {
                Self::compare_versions(actual, &target_values[0], Ordering::is_gt)
            }
            SignalOperator::SemanticVersionGreaterEqual => {
                Self::compare_versions(actual, &target_values[0], Ordering::is_ge)
            }
            SignalOperator::Unknown => {
                trace!(signal_key = %signal_key, "Unknown signal operator");
                false
            }
        }
    }

    fn any_target(
        target_values: &[String],
        actual: &SignalValue,
        matches: impl Fn(&str, &str) -> bool,
    ) -> bool {
        let actual = actual.to_string();
        target_values
            .iter()
            .any(|target| matches(target.as_str(), actual.as_str()))
    }

    fn compare_numbers(
        actual: &SignalValue,
        target: &str,
        accept: impl Fn(Ordering) -> bool,
    ) -> bool {
        let actual = actual.as_number();
        let target = target.trim().parse::<f64>().ok();
        match (actual, target) {
            (Some(a), Some(t)) => a.partial_cmp(&t).is_some_and(accept),
            _ => false,
        }
    }

    fn compare_versions(
        actual: &SignalValue,
        target: &str,
        accept: impl Fn(Ordering) -> bool,
    ) -> bool {
        let actual = actual.to_string();
        match (parse_version(&actual), parse_version(target)) {
            (Some(a), Some(t)) => accept(a.cmp(&t)),
            _ => false,
        }
    }
}

/// Compile a regex target once and reuse it across evaluations
fn compiled_regex(pattern: &str) -> Option<Regex> {
    if let Some(cached) = REGEX_CACHE.read().get(pattern) {
        return cached.clone();
    }

    let compiled = match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            trace!(pattern = %pattern, error = %e, "Invalid signal regex");
            None
        }
    };

    let mut cache = REGEX_CACHE.write();
    if cache.len() >= MAX_CACHED_PATTERNS {
        cache.clear();
    }
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

/// Parse a dotted version into a fixed-width array, padding missing
/// segments with zero. Rejects versions longer than five segments and
/// segments that are not unsigned integers.
fn parse_version(version: &str) -> Option<[u64; MAX_SEMANTIC_VERSION_SEGMENTS]> {
    let mut segments = [0u64; MAX_SEMANTIC_VERSION_SEGMENTS];
    for (i, part) in version.split('.').enumerate() {
        if i >= MAX_SEMANTIC_VERSION_SEGMENTS {
            return None;
        }
        segments[i] = part.trim().parse().ok()?;
    }
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn check(op: SignalOperator, actual: impl Into<SignalValue>, target: &[&str]) -> bool {
        let context = EvaluationContext::new().with_signal("key", actual);
        SignalComparator::compare(op, "key", &targets(target), &context)
    }

    #[test]
    fn test_missing_signal_or_targets() {
        let context = EvaluationContext::new().with_signal("key", "value");
        assert!(!SignalComparator::compare(
            SignalOperator::StringContains,
            "other",
            &targets(&["v"]),
            &context
        ));
        assert!(!SignalComparator::compare(
            SignalOperator::StringContains,
            "key",
            &[],
            &context
        ));
        assert!(!SignalComparator::compare(
            SignalOperator::StringContains,
            "",
            &targets(&["v"]),
            &context
        ));
    }

    #[test]
    fn test_unknown_operator_never_matches() {
        assert!(!check(SignalOperator::Unknown, "value", &["value"]));
    }

    #[test]
    fn test_string_contains() {
        assert!(check(SignalOperator::StringContains, "hello world", &["xyz", "world"]));
        assert!(!check(SignalOperator::StringContains, "hello world", &["World"]));
        assert!(check(SignalOperator::StringContains, 12345, &["234"]));
    }

    #[test]
    fn test_string_does_not_contain() {
        assert!(check(SignalOperator::StringDoesNotContain, "hello", &["xyz", "abc"]));
        // Any target missing from the signal is enough
        assert!(check(SignalOperator::StringDoesNotContain, "hello", &["xyz", "ell"]));
        assert!(!check(SignalOperator::StringDoesNotContain, "hello", &["ell"]));
        assert!(!check(SignalOperator::StringDoesNotContain, "hello", &["he", "llo"]));
    }

    #[test]
    fn test_string_exactly_matches_trims() {
        assert!(check(SignalOperator::StringExactlyMatches, " gold ", &["silver", "gold"]));
        assert!(!check(SignalOperator::StringExactlyMatches, "golden", &["gold"]));
    }

    #[test]
    fn test_string_contains_regex() {
        let pattern = r"@example\.com$";
        assert!(check(SignalOperator::StringContainsRegex, "user@example.com", &[pattern]));
        assert!(!check(SignalOperator::StringContainsRegex, "user@example.org", &[pattern]));
        // Invalid pattern is skipped, valid one still matches
        assert!(check(SignalOperator::StringContainsRegex, "abc", &["(", "b"]));
    }

    #[test]
    fn test_regex_targets_are_compiled_once() {
        let pattern = r"^tier-(gold|platinum)$";
        assert!(check(SignalOperator::StringContainsRegex, "tier-gold", &[pattern]));
        assert!(REGEX_CACHE.read().contains_key(pattern));
        assert!(check(SignalOperator::StringContainsRegex, "tier-platinum", &[pattern]));

        assert!(!check(SignalOperator::StringContainsRegex, "x", &["[unclosed"]));
        assert!(matches!(REGEX_CACHE.read().get("[unclosed"), Some(None)));
    }

    #[test]
    fn test_numeric_operators() {
        assert!(check(SignalOperator::NumericLessThan, 5, &["10"]));
        assert!(check(SignalOperator::NumericLessEqual, "10", &["10.0"]));
        assert!(check(SignalOperator::NumericEqual, 2.5, &[" 2.5 "]));
        assert!(check(SignalOperator::NumericNotEqual, 3, &["4"]));
        assert!(check(SignalOperator::NumericGreaterThan, "11", &["10", "100"]));
        assert!(check(SignalOperator::NumericGreaterEqual, -1, &["-1"]));
        assert!(!check(SignalOperator::NumericGreaterThan, 9, &["10"]));
    }

    #[test]
    fn test_numeric_parse_failure() {
        assert!(!check(SignalOperator::NumericEqual, "abc", &["1"]));
        assert!(!check(SignalOperator::NumericNotEqual, 1, &["abc"]));
        assert!(!check(SignalOperator::NumericNotEqual, "NaN", &["1"]));
    }

    #[test]
    fn test_semantic_version_missing_segments_are_zero() {
        assert!(check(SignalOperator::SemanticVersionGreaterThan, "1.2.3", &["1.2"]));
        assert!(check(SignalOperator::SemanticVersionEqual, "1.2.0", &["1.2"]));
        assert!(check(SignalOperator::SemanticVersionLessThan, "1.9", &["1.10"]));
        assert!(check(SignalOperator::SemanticVersionGreaterEqual, "2", &["1.99.99"]));
        assert!(check(SignalOperator::SemanticVersionNotEqual, "1.0.1", &["1"]));
        assert!(check(SignalOperator::SemanticVersionLessEqual, "1.2.3.4.5", &["1.2.3.4.5"]));
    }

    #[test]
    fn test_semantic_version_too_long() {
        for op in [
            SignalOperator::SemanticVersionLessThan,
            SignalOperator::SemanticVersionLessEqual,
            SignalOperator::SemanticVersionEqual,
            SignalOperator::SemanticVersionNotEqual,
            SignalOperator::SemanticVersionGreaterThan,
            SignalOperator::SemanticVersionGreaterEqual,
        ] {
            assert!(!check(op, "1.2.3.4.5.6", &["1.0"]), "{op} should not match");
            assert!(!check(op, "1.0", &["1.2.3.4.5.6"]), "{op} should not match");
        }
    }

    #[test]
    fn test_semantic_version_non_numeric() {
        assert!(!check(SignalOperator::SemanticVersionEqual, "1.2.beta", &["1.2.0"]));
        assert!(!check(SignalOperator::SemanticVersionNotEqual, "1..2", &["1.0.2"]));
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3"), Some([1, 2, 3, 0, 0]));
        assert_eq!(parse_version("7"), Some([7, 0, 0, 0, 0]));
        assert_eq!(parse_version(""), None);
        assert_eq!(parse_version("1.2.3.4.5.6"), None);
    }
}
