//! Remote Config Templates for Armature
//!
//! Server-side evaluation of remote config templates: named conditions,
//! percentage rollouts, custom signal targeting, and typed parameter
//! resolution with in-app defaults.
//!
//! # Features
//!
//! - 🎯 **Conditions** - Nested AND/OR expressions over custom signals
//! - 🎲 **Percentage Rollout** - Stable, seeded micro-percent buckets
//! - 🔢 **Typed Signals** - String, regex, numeric, and semantic version comparisons
//! - 🧩 **Defaults** - Caller defaults merged under template values
//! - 📦 **Client Fetch** - Serialize resolved configs for client SDKs
//!
//! # Quick Start
//!
//! ```
//! use armature_remote_config::*;
//!
//! let template = Template::new()
//!     .with_condition(
//!         "ios_beta",
//!         ConditionExpr::and(vec![
//!             ConditionExpr::custom_signal(
//!                 SignalOperator::StringExactlyMatches,
//!                 "platform",
//!                 vec!["ios".to_string()],
//!             ),
//!             ConditionExpr::percent(PercentCondition::less_or_equal(100_000_000)),
//!         ]),
//!     )
//!     .with_parameter(
//!         "new_checkout",
//!         Parameter::with_default_value("false")
//!             .with_conditional_value("ios_beta", ParameterValue::explicit("true")),
//!     );
//!
//! let server = ServerTemplate::builder()
//!     .default_value("max_items", 25)
//!     .template(template)
//!     .build()
//!     .unwrap();
//!
//! let context = EvaluationContext::new()
//!     .with_randomization_id("device-42")
//!     .with_signal("platform", "ios");
//!
//! let config = server.evaluate(&context).unwrap();
//! assert!(config.get_boolean("new_checkout"));
//! assert_eq!(config.get_number("max_items"), 25.0);
//! ```
//!
//! # Percentage Rollout
//!
//! ```
//! use armature_remote_config::*;
//!
//! // Roughly 10% of clients, bucketed independently per seed
//! let rollout = ConditionExpr::percent(
//!     PercentCondition::less_or_equal(10_000_000).with_seed("checkout-2024"),
//! );
//!
//! let context = EvaluationContext::new().with_randomization_id("device-42");
//! let first = ConditionEvaluator::evaluate(&rollout, &context, 0);
//! let second = ConditionEvaluator::evaluate(&rollout, &context, 0);
//! assert_eq!(first, second);
//! ```
//!
//! # Client Fetch
//!
//! ```
//! use armature_remote_config::*;
//!
//! let server = ServerTemplate::builder()
//!     .template(Template::new().with_parameter("theme", Parameter::with_default_value("dark")))
//!     .build()
//!     .unwrap();
//!
//! let config = server.evaluate(&EvaluationContext::new()).unwrap();
//! let response = ParameterValueCodec::to_fetch_response(&config);
//! assert_eq!(response.status, 200);
//! assert_eq!(response.config["theme"], "dark");
//! ```

pub mod bucket;
pub mod codec;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod resolver;
pub mod server;
pub mod signal;
pub mod source;
pub mod template;
pub mod value;

pub use bucket::PercentileBucketer;
pub use codec::{FetchResponse, ParameterValueCodec};
pub use context::{EvaluationContext, SignalValue};
pub use error::{RemoteConfigError, RemoteConfigResult};
pub use evaluator::{ConditionEvaluator, ConditionResults, MAX_CONDITION_DEPTH};
pub use resolver::{ResolvedConfig, TemplateConfigResolver};
pub use server::{ServerTemplate, ServerTemplateBuilder};
pub use signal::SignalComparator;
pub use source::{StaticTemplateSource, TemplateSource};
pub use template::{
    ConditionExpr, CustomSignalCondition, MicroPercentRange, NamedCondition, Parameter,
    ParameterGroup, ParameterValue, ParameterValueType, PercentCondition, PercentOperator,
    SignalOperator, Template, Version, MICRO_PERCENT_MAX,
};
pub use value::{DefaultValue, ValueAccessor, ValueSource};
