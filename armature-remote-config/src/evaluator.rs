//! Condition Evaluation
//!
//! Evaluates a template's named conditions against an evaluation context.
//! Evaluation is pure and never fails: unknown expressions, unknown
//! operators, a missing randomization id, and nesting deeper than
//! [`MAX_CONDITION_DEPTH`] all evaluate to `false`.

use crate::bucket::PercentileBucketer;
use crate::context::EvaluationContext;
use crate::signal::SignalComparator;
use crate::template::{ConditionExpr, NamedCondition, PercentCondition, PercentOperator};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

/// Maximum nesting of AND/OR expressions. Deeper compound expressions
/// evaluate to `false`.
pub const MAX_CONDITION_DEPTH: usize = 10;

/// Condition results in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionResults {
    order: Vec<String>,
    values: HashMap<String, bool>,
}

impl ConditionResults {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Record a result. A repeated name keeps its first position and value.
    pub fn insert(&mut self, name: impl Into<String>, value: bool) {
        let name = name.into();
        if let Entry::Vacant(entry) = self.values.entry(name.clone()) {
            entry.insert(value);
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    /// `true` only if the condition exists and evaluated to true
    pub fn is_true(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    /// Iterate results in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.values.get(name).copied().unwrap_or(false)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Recursive condition evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate every named condition, preserving declaration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use armature_remote_config::*;
    ///
    /// let conditions = vec![
    ///     NamedCondition::new("always", ConditionExpr::True),
    ///     NamedCondition::new("never", ConditionExpr::or(vec![])),
    /// ];
    /// let results = ConditionEvaluator::evaluate_all(&conditions, &EvaluationContext::new());
    ///
    /// assert!(results.is_true("always"));
    /// assert!(!results.is_true("never"));
    /// ```
    pub fn evaluate_all(
        conditions: &[NamedCondition],
        context: &EvaluationContext,
    ) -> ConditionResults {
        let mut results = ConditionResults::with_capacity(conditions.len());
        for condition in conditions {
            let value = Self::evaluate(&condition.expression, context, 0);
            trace!(condition = %condition.name, result = value, "Condition evaluated");
            results.insert(condition.name.clone(), value);
        }
        results
    }

    /// Evaluate one expression at the given AND/OR nesting depth
    pub fn evaluate(expr: &ConditionExpr, context: &EvaluationContext, depth: usize) -> bool {
        match expr {
            ConditionExpr::Or(_) | ConditionExpr::And(_) if depth >= MAX_CONDITION_DEPTH => {
                trace!(depth, "Condition nesting limit reached");
                false
            }
            ConditionExpr::Or(conditions) => conditions
                .iter()
                .any(|c| Self::evaluate(c, context, depth + 1)),
            ConditionExpr::And(conditions) => conditions
                .iter()
                .all(|c| Self::evaluate(c, context, depth + 1)),
            ConditionExpr::True => true,
            ConditionExpr::False => false,
            ConditionExpr::Percent(condition) => Self::evaluate_percent(condition, context),
            ConditionExpr::CustomSignal(condition) => {
                SignalComparator::evaluate(condition, context)
            }
            ConditionExpr::Unknown => {
                trace!("Unknown condition expression");
                false
            }
        }
    }

    /// Evaluate a percent condition against the context's randomization id
    pub fn evaluate_percent(condition: &PercentCondition, context: &EvaluationContext) -> bool {
        let Some(randomization_id) = context.randomization_id() else {
            trace!("No randomization id, percent condition does not match");
            return false;
        };

        if condition.operator == PercentOperator::Unknown {
            trace!("Unknown percent operator");
            return false;
        }

        let bucket = PercentileBucketer::bucket(condition.seed.as_deref(), randomization_id);

        match condition.operator {
            PercentOperator::LessOrEqual => bucket <= condition.micro_percent,
            PercentOperator::GreaterThan => bucket > condition.micro_percent,
            PercentOperator::Between => {
                let range = condition.micro_percent_range.unwrap_or_default();
                range.lower < bucket && bucket <= range.upper
            }
            PercentOperator::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{MICRO_PERCENT_MAX, SignalOperator};

    fn nested_and(levels: usize) -> ConditionExpr {
        (0..levels).fold(ConditionExpr::True, |inner, _| ConditionExpr::and(vec![inner]))
    }

    #[test]
    fn test_literals() {
        let context = EvaluationContext::new();
        assert!(ConditionEvaluator::evaluate(&ConditionExpr::True, &context, 0));
        assert!(!ConditionEvaluator::evaluate(&ConditionExpr::False, &context, 0));
        assert!(!ConditionEvaluator::evaluate(&ConditionExpr::Unknown, &context, 0));
    }

    #[test]
    fn test_vacuous_and_empty_or() {
        let context = EvaluationContext::new();
        assert!(ConditionEvaluator::evaluate(&ConditionExpr::and(vec![]), &context, 0));
        assert!(!ConditionEvaluator::evaluate(&ConditionExpr::or(vec![]), &context, 0));
    }

    #[test]
    fn test_and_or_combinations() {
        let context = EvaluationContext::new();
        let expr = ConditionExpr::or(vec![
            ConditionExpr::and(vec![ConditionExpr::True, ConditionExpr::False]),
            ConditionExpr::and(vec![ConditionExpr::True, ConditionExpr::True]),
        ]);
        assert!(ConditionEvaluator::evaluate(&expr, &context, 0));

        let expr = ConditionExpr::and(vec![ConditionExpr::True, ConditionExpr::Unknown]);
        assert!(!ConditionEvaluator::evaluate(&expr, &context, 0));
    }

    #[test]
    fn test_depth_ceiling() {
        let context = EvaluationContext::new();
        assert!(ConditionEvaluator::evaluate(&nested_and(10), &context, 0));
        assert!(!ConditionEvaluator::evaluate(&nested_and(11), &context, 0));
    }

    #[test]
    fn test_evaluate_all_keeps_declaration_order() {
        let conditions = vec![
            NamedCondition::new("zeta", ConditionExpr::False),
            NamedCondition::new("alpha", ConditionExpr::True),
            NamedCondition::new("mid", ConditionExpr::and(vec![])),
        ];
        let results = ConditionEvaluator::evaluate_all(&conditions, &EvaluationContext::new());

        let ordered: Vec<_> = results.iter().collect();
        assert_eq!(ordered, vec![("zeta", false), ("alpha", true), ("mid", true)]);
        assert_eq!(results.len(), 3);
        assert_eq!(results.get("missing"), None);
    }

    #[test]
    fn test_repeated_condition_name_keeps_first_result() {
        let conditions = vec![
            NamedCondition::new("dup", ConditionExpr::True),
            NamedCondition::new("other", ConditionExpr::False),
            NamedCondition::new("dup", ConditionExpr::False),
        ];
        let results = ConditionEvaluator::evaluate_all(&conditions, &EvaluationContext::new());

        let ordered: Vec<_> = results.iter().collect();
        assert_eq!(ordered, vec![("dup", true), ("other", false)]);
        assert!(results.is_true("dup"));
    }

    #[test]
    fn test_percent_requires_randomization_id() {
        let condition = PercentCondition::less_or_equal(MICRO_PERCENT_MAX);
        assert!(!ConditionEvaluator::evaluate_percent(&condition, &EvaluationContext::new()));

        let context = EvaluationContext::new().with_randomization_id("");
        assert!(!ConditionEvaluator::evaluate_percent(&condition, &context));

        let context = EvaluationContext::new().with_randomization_id("user-1");
        assert!(ConditionEvaluator::evaluate_percent(&condition, &context));
    }

    #[test]
    fn test_percent_operators() {
        let context = EvaluationContext::new().with_randomization_id("user-1");
        let bucket = PercentileBucketer::bucket(Some("seed"), "user-1");

        let at = PercentCondition::less_or_equal(bucket).with_seed("seed");
        assert!(ConditionEvaluator::evaluate_percent(&at, &context));

        let above = PercentCondition::greater_than(bucket).with_seed("seed");
        assert!(!ConditionEvaluator::evaluate_percent(&above, &context));

        let upper_inclusive =
            PercentCondition::between(bucket.saturating_sub(1), bucket).with_seed("seed");
        assert!(ConditionEvaluator::evaluate_percent(&upper_inclusive, &context));

        let lower_exclusive =
            PercentCondition::between(bucket, MICRO_PERCENT_MAX).with_seed("seed");
        assert!(!ConditionEvaluator::evaluate_percent(&lower_exclusive, &context));

        let unknown = PercentCondition::new(PercentOperator::Unknown);
        assert!(!ConditionEvaluator::evaluate_percent(&unknown, &context));
    }

    #[test]
    fn test_between_without_range_never_matches() {
        let context = EvaluationContext::new().with_randomization_id("user-1");
        let condition = PercentCondition::new(PercentOperator::Between);
        assert!(!ConditionEvaluator::evaluate_percent(&condition, &context));
    }

    #[test]
    fn test_custom_signal_delegation() {
        let context = EvaluationContext::new().with_signal("app_version", "2.4.0");
        let expr = ConditionExpr::custom_signal(
            SignalOperator::SemanticVersionGreaterEqual,
            "app_version",
            vec!["2.0".to_string()],
        );
        assert!(ConditionEvaluator::evaluate(&expr, &context, 0));
    }
}
