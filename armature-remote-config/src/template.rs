//! Server Template Model
//!
//! Defines templates, named conditions, condition expressions, and
//! parameters. A [`Template`] is an immutable snapshot: it is built once
//! (in code or by a [`TemplateSource`](crate::TemplateSource)) and shared
//! behind an `Arc` for every evaluation.

use crate::error::{RemoteConfigError, RemoteConfigResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Upper bound of the micro-percent space (exclusive for buckets).
pub const MICRO_PERCENT_MAX: u64 = 100_000_000;

/// Server template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    /// Conditions in priority order
    pub conditions: Vec<NamedCondition>,

    /// Parameters by key
    pub parameters: BTreeMap<String, Parameter>,

    /// Parameter groups by name (not consulted during evaluation)
    pub parameter_groups: BTreeMap<String, ParameterGroup>,

    /// Backend entity tag
    pub etag: String,

    /// Version metadata
    pub version: Option<Version>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition. Declaration order is priority order.
    pub fn with_condition(mut self, name: impl Into<String>, expression: ConditionExpr) -> Self {
        self.conditions.push(NamedCondition::new(name, expression));
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, parameter: Parameter) -> Self {
        self.parameters.insert(key.into(), parameter);
        self
    }

    pub fn with_parameter_group(mut self, name: impl Into<String>, group: ParameterGroup) -> Self {
        self.parameter_groups.insert(name.into(), group);
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = etag.into();
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Look up a condition by name
    pub fn condition(&self, name: &str) -> Option<&NamedCondition> {
        self.conditions.iter().find(|c| c.name == name)
    }

    /// Check that condition names are unique
    pub fn validate(&self) -> RemoteConfigResult<()> {
        let mut seen = HashSet::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            if !seen.insert(condition.name.as_str()) {
                return Err(RemoteConfigError::DuplicateCondition(
                    condition.name.clone(),
                ));
            }
        }
        Ok(())
    }
}

/// A condition expression with a stable name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCondition {
    pub name: String,
    pub expression: ConditionExpr,
}

impl NamedCondition {
    pub fn new(name: impl Into<String>, expression: ConditionExpr) -> Self {
        Self {
            name: name.into(),
            expression,
        }
    }
}

/// Boolean condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpr {
    /// True if any sub-expression is true
    Or(Vec<ConditionExpr>),
    /// True if every sub-expression is true
    And(Vec<ConditionExpr>),
    True,
    False,
    /// Percentage rollout on the randomization id
    Percent(PercentCondition),
    /// Comparison against a custom signal
    CustomSignal(CustomSignalCondition),
    /// A condition kind this version does not understand; never matches
    Unknown,
}

impl ConditionExpr {
    pub fn or(conditions: Vec<ConditionExpr>) -> Self {
        Self::Or(conditions)
    }

    pub fn and(conditions: Vec<ConditionExpr>) -> Self {
        Self::And(conditions)
    }

    pub fn percent(condition: PercentCondition) -> Self {
        Self::Percent(condition)
    }

    pub fn custom_signal(
        operator: SignalOperator,
        signal_key: impl Into<String>,
        target_values: Vec<String>,
    ) -> Self {
        Self::CustomSignal(CustomSignalCondition::new(
            operator,
            signal_key,
            target_values,
        ))
    }
}

/// Percent condition
#[derive(Debug, Clone, PartialEq)]
pub struct PercentCondition {
    /// Seed prepended to the randomization id before hashing
    pub seed: Option<String>,

    pub operator: PercentOperator,

    /// Threshold for `LessOrEqual` and `GreaterThan`
    pub micro_percent: u64,

    /// Bounds for `Between`
    pub micro_percent_range: Option<MicroPercentRange>,
}

impl PercentCondition {
    pub fn new(operator: PercentOperator) -> Self {
        Self {
            seed: None,
            operator,
            micro_percent: 0,
            micro_percent_range: None,
        }
    }

    /// Bucket `<= micro_percent`
    pub fn less_or_equal(micro_percent: u64) -> Self {
        Self::new(PercentOperator::LessOrEqual).with_micro_percent(micro_percent)
    }

    /// Bucket `> micro_percent`
    pub fn greater_than(micro_percent: u64) -> Self {
        Self::new(PercentOperator::GreaterThan).with_micro_percent(micro_percent)
    }

    /// `lower < bucket <= upper`
    pub fn between(lower: u64, upper: u64) -> Self {
        Self::new(PercentOperator::Between).with_range(lower, upper)
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_micro_percent(mut self, micro_percent: u64) -> Self {
        self.micro_percent = micro_percent.min(MICRO_PERCENT_MAX);
        self
    }

    pub fn with_range(mut self, lower: u64, upper: u64) -> Self {
        self.micro_percent_range = Some(MicroPercentRange {
            lower: lower.min(MICRO_PERCENT_MAX),
            upper: upper.min(MICRO_PERCENT_MAX),
        });
        self
    }
}

/// Micro-percent bounds for a `Between` percent condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MicroPercentRange {
    /// Exclusive lower bound
    pub lower: u64,
    /// Inclusive upper bound
    pub upper: u64,
}

/// Percent condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PercentOperator {
    LessOrEqual,
    GreaterThan,
    Between,
    Unknown,
}

impl PercentOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessOrEqual => "LESS_OR_EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::Between => "BETWEEN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for PercentOperator {
    fn from(name: &str) -> Self {
        match name {
            "LESS_OR_EQUAL" => Self::LessOrEqual,
            "GREATER_THAN" => Self::GreaterThan,
            "BETWEEN" => Self::Between,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PercentOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom signal condition
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSignalCondition {
    pub operator: SignalOperator,

    /// Key looked up in the evaluation context
    pub signal_key: String,

    /// Values to compare against
    pub target_values: Vec<String>,
}

impl CustomSignalCondition {
    pub fn new(
        operator: SignalOperator,
        signal_key: impl Into<String>,
        target_values: Vec<String>,
    ) -> Self {
        Self {
            operator,
            signal_key: signal_key.into(),
            target_values,
        }
    }
}

/// Custom signal comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalOperator {
    StringContains,
    StringDoesNotContain,
    StringExactlyMatches,
    StringContainsRegex,
    NumericLessThan,
    NumericLessEqual,
    NumericEqual,
    NumericNotEqual,
    NumericGreaterThan,
    NumericGreaterEqual,
    SemanticVersionLessThan,
    SemanticVersionLessEqual,
    SemanticVersionEqual,
    SemanticVersionNotEqual,
    SemanticVersionGreaterThan,
    SemanticVersionGreaterEqual,
    Unknown,
}

impl SignalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StringContains => "STRING_CONTAINS",
            Self::StringDoesNotContain => "STRING_DOES_NOT_CONTAIN",
            Self::StringExactlyMatches => "STRING_EXACTLY_MATCHES",
            Self::StringContainsRegex => "STRING_CONTAINS_REGEX",
            Self::NumericLessThan => "NUMERIC_LESS_THAN",
            Self::NumericLessEqual => "NUMERIC_LESS_EQUAL",
            Self::NumericEqual => "NUMERIC_EQUAL",
            Self::NumericNotEqual => "NUMERIC_NOT_EQUAL",
            Self::NumericGreaterThan => "NUMERIC_GREATER_THAN",
            Self::NumericGreaterEqual => "NUMERIC_GREATER_EQUAL",
            Self::SemanticVersionLessThan => "SEMANTIC_VERSION_LESS_THAN",
            Self::SemanticVersionLessEqual => "SEMANTIC_VERSION_LESS_EQUAL",
            Self::SemanticVersionEqual => "SEMANTIC_VERSION_EQUAL",
            Self::SemanticVersionNotEqual => "SEMANTIC_VERSION_NOT_EQUAL",
            Self::SemanticVersionGreaterThan => "SEMANTIC_VERSION_GREATER_THAN",
            Self::SemanticVersionGreaterEqual => "SEMANTIC_VERSION_GREATER_EQUAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for SignalOperator {
    fn from(name: &str) -> Self {
        match name {
            "STRING_CONTAINS" => Self::StringContains,
            "STRING_DOES_NOT_CONTAIN" => Self::StringDoesNotContain,
            "STRING_EXACTLY_MATCHES" => Self::StringExactlyMatches,
            "STRING_CONTAINS_REGEX" => Self::StringContainsRegex,
            "NUMERIC_LESS_THAN" => Self::NumericLessThan,
            "NUMERIC_LESS_EQUAL" => Self::NumericLessEqual,
            "NUMERIC_EQUAL" => Self::NumericEqual,
            "NUMERIC_NOT_EQUAL" => Self::NumericNotEqual,
            "NUMERIC_GREATER_THAN" => Self::NumericGreaterThan,
            "NUMERIC_GREATER_EQUAL" => Self::NumericGreaterEqual,
            "SEMANTIC_VERSION_LESS_THAN" => Self::SemanticVersionLessThan,
            "SEMANTIC_VERSION_LESS_EQUAL" => Self::SemanticVersionLessEqual,
            "SEMANTIC_VERSION_EQUAL" => Self::SemanticVersionEqual,
            "SEMANTIC_VERSION_NOT_EQUAL" => Self::SemanticVersionNotEqual,
            "SEMANTIC_VERSION_GREATER_THAN" => Self::SemanticVersionGreaterThan,
            "SEMANTIC_VERSION_GREATER_EQUAL" => Self::SemanticVersionGreaterEqual,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for SignalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    /// A concrete value
    Explicit { value: String },
    /// Omit the key so the application's own default applies
    UseInAppDefault,
}

impl ParameterValue {
    pub fn explicit(value: impl Into<String>) -> Self {
        Self::Explicit {
            value: value.into(),
        }
    }

    pub fn in_app_default() -> Self {
        Self::UseInAppDefault
    }
}

/// Declared type of a parameter's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterValueType {
    String,
    Boolean,
    Number,
    Json,
    #[default]
    Unspecified,
}

impl ParameterValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Boolean => "BOOLEAN",
            Self::Number => "NUMBER",
            Self::Json => "JSON",
            Self::Unspecified => "PARAMETER_VALUE_TYPE_UNSPECIFIED",
        }
    }
}

impl From<&str> for ParameterValueType {
    fn from(name: &str) -> Self {
        match name {
            "STRING" => Self::String,
            "BOOLEAN" => Self::Boolean,
            "NUMBER" => Self::Number,
            "JSON" => Self::Json,
            _ => Self::Unspecified,
        }
    }
}

/// Template parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    /// Value used when no conditional value applies
    pub default_value: Option<ParameterValue>,

    /// Values keyed by condition name
    pub conditional_values: HashMap<String, ParameterValue>,

    pub value_type: ParameterValueType,

    pub description: Option<String>,
}

impl Parameter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter with an explicit default value
    pub fn with_default_value(value: impl Into<String>) -> Self {
        Self::new().with_default(ParameterValue::explicit(value))
    }

    pub fn with_default(mut self, value: ParameterValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_conditional_value(
        mut self,
        condition: impl Into<String>,
        value: ParameterValue,
    ) -> Self {
        self.conditional_values.insert(condition.into(), value);
        self
    }

    pub fn with_value_type(mut self, value_type: ParameterValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Named group of parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterGroup {
    pub description: Option<String>,
    pub parameters: BTreeMap<String, Parameter>,
}

/// Template version metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Version {
    pub version_number: Option<String>,
    pub update_time: Option<DateTime<Utc>>,
    pub update_origin: Option<String>,
    pub update_type: Option<String>,
    pub update_user: Option<String>,
    pub description: Option<String>,
    pub rollback_source: Option<String>,
    pub is_legacy: bool,
}

impl Version {
    pub fn new(version_number: impl Into<String>) -> Self {
        Self {
            version_number: Some(version_number.into()),
            ..Self::default()
        }
    }

    pub fn with_update_time(mut self, update_time: DateTime<Utc>) -> Self {
        self.update_time = Some(update_time);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let template = Template::new()
            .with_condition("beta", ConditionExpr::True)
            .with_condition("beta", ConditionExpr::False);

        let err = template.validate().unwrap_err();
        assert!(matches!(err, RemoteConfigError::DuplicateCondition(name) if name == "beta"));
    }

    #[test]
    fn test_condition_order_is_declaration_order() {
        let template = Template::new()
            .with_condition("z", ConditionExpr::True)
            .with_condition("a", ConditionExpr::False);

        assert!(template.validate().is_ok());
        let names: Vec<_> = template.conditions.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(template.condition("a").map(|c| &c.expression), Some(&ConditionExpr::False));
    }

    #[test]
    fn test_operator_wire_names() {
        assert_eq!(
            SignalOperator::from("SEMANTIC_VERSION_GREATER_THAN"),
            SignalOperator::SemanticVersionGreaterThan
        );
        assert_eq!(SignalOperator::from("STRING_SOUNDS_LIKE"), SignalOperator::Unknown);
        assert_eq!(PercentOperator::from("BETWEEN"), PercentOperator::Between);
        assert_eq!(PercentOperator::from("less_or_equal"), PercentOperator::Unknown);
        assert_eq!(SignalOperator::NumericNotEqual.to_string(), "NUMERIC_NOT_EQUAL");
        assert_eq!(ParameterValueType::from("JSON"), ParameterValueType::Json);
    }

    #[test]
    fn test_micro_percent_is_clamped() {
        let condition = PercentCondition::less_or_equal(200_000_000);
        assert_eq!(condition.micro_percent, MICRO_PERCENT_MAX);

        let condition = PercentCondition::between(10, 500_000_000);
        assert_eq!(
            condition.micro_percent_range,
            Some(MicroPercentRange {
                lower: 10,
                upper: MICRO_PERCENT_MAX
            })
        );
    }

    #[test]
    fn test_parameter_builder() {
        let parameter = Parameter::with_default_value("blue")
            .with_conditional_value("beta", ParameterValue::in_app_default())
            .with_value_type(ParameterValueType::String)
            .with_description("Button color");

        assert_eq!(parameter.default_value, Some(ParameterValue::explicit("blue")));
        assert_eq!(
            parameter.conditional_values.get("beta"),
            Some(&ParameterValue::UseInAppDefault)
        );
        assert_eq!(parameter.value_type.as_str(), "STRING");
    }
}
