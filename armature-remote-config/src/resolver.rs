//! Parameter Resolution
//!
//! Merges the caller's default config with the values a template assigns
//! for one evaluation context.

use crate::context::EvaluationContext;
use crate::evaluator::{ConditionEvaluator, ConditionResults};
use crate::template::{Parameter, ParameterValue, Template};
use crate::value::{DefaultValue, ValueAccessor, ValueSource};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Resolved configuration for one evaluation
///
/// Lookups never fail: a key that resolved to nothing reads as the static
/// default (`""`, `false`, `0`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    values: BTreeMap<String, ValueAccessor>,
}

impl ResolvedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: ValueAccessor) {
        self.values.insert(key.into(), value);
    }

    pub fn get_value(&self, key: &str) -> ValueAccessor {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(ValueAccessor::static_default)
    }

    pub fn get_boolean(&self, key: &str) -> bool {
        self.get_value(key).as_boolean()
    }

    pub fn get_number(&self, key: &str) -> f64 {
        self.get_value(key).as_number()
    }

    pub fn get_string(&self, key: &str) -> String {
        self.values
            .get(key)
            .map(|v| v.as_string().to_string())
            .unwrap_or_default()
    }

    /// All resolved values, keyed by parameter
    pub fn get_all(&self) -> &BTreeMap<String, ValueAccessor> {
        &self.values
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueAccessor)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves template parameters into a [`ResolvedConfig`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateConfigResolver;

impl TemplateConfigResolver {
    /// Resolve every parameter of `template` for `context`.
    ///
    /// Default config entries are seeded first. For each parameter, the
    /// first condition in template order that evaluated to true and has a
    /// conditional value wins; otherwise the parameter's default value
    /// applies. An in-app default (or no value at all) leaves the key as
    /// the default config has it, or absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use armature_remote_config::*;
    /// use std::collections::HashMap;
    ///
    /// let template = Template::new()
    ///     .with_condition("beta", ConditionExpr::True)
    ///     .with_parameter(
    ///         "welcome",
    ///         Parameter::with_default_value("hello")
    ///             .with_conditional_value("beta", ParameterValue::explicit("hello, tester")),
    ///     );
    ///
    /// let context = EvaluationContext::new();
    /// let config = TemplateConfigResolver::evaluate(&template, &HashMap::new(), &context);
    /// assert_eq!(config.get_string("welcome"), "hello, tester");
    /// ```
    pub fn evaluate(
        template: &Template,
        default_config: &HashMap<String, DefaultValue>,
        context: &EvaluationContext,
    ) -> ResolvedConfig {
        let mut config = ResolvedConfig::new();
        for (key, value) in default_config {
            config.insert(key.clone(), ValueAccessor::default_config(value.to_raw()));
        }

        let results = ConditionEvaluator::evaluate_all(&template.conditions, context);

        for (key, parameter) in &template.parameters {
            match Self::resolve_parameter(template, parameter, &results) {
                Some(ParameterValue::Explicit { value }) => {
                    config.insert(key.clone(), ValueAccessor::remote(value.clone()));
                }
                Some(ParameterValue::UseInAppDefault) | None => {}
            }
        }

        debug!(
            conditions = results.len(),
            parameters = template.parameters.len(),
            resolved = config.len(),
            remote = config.iter().filter(|(_, v)| v.source() == ValueSource::Remote).count(),
            "Template evaluated"
        );

        config
    }

    /// Pick the value a parameter takes, walking conditions in template order
    fn resolve_parameter<'a>(
        template: &Template,
        parameter: &'a Parameter,
        results: &ConditionResults,
    ) -> Option<&'a ParameterValue> {
        template
            .conditions
            .iter()
            .filter(|condition| results.is_true(&condition.name))
            .find_map(|condition| parameter.conditional_values.get(&condition.name))
            .or(parameter.default_value.as_ref())
    }
}
