//! Server Template
//!
//! Caches the current template and the caller's default config, and
//! evaluates them per request. The cached template is replaced wholesale by
//! `set()` or `load()`; each `evaluate()` takes one snapshot up front, so a
//! concurrent reload never mixes two template versions in one result.

use crate::context::EvaluationContext;
use crate::error::{RemoteConfigError, RemoteConfigResult};
use crate::resolver::{ResolvedConfig, TemplateConfigResolver};
use crate::source::TemplateSource;
use crate::template::Template;
use crate::value::DefaultValue;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Cached server template
pub struct ServerTemplate {
    default_config: HashMap<String, DefaultValue>,
    cache: RwLock<Option<Arc<Template>>>,
    source: Option<Arc<dyn TemplateSource>>,
}

impl ServerTemplate {
    /// Create a new builder
    pub fn builder() -> ServerTemplateBuilder {
        ServerTemplateBuilder::new()
    }

    /// Fetch the template from the configured source and cache it.
    ///
    /// On failure the previously cached template stays in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use armature_remote_config::*;
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let source = Arc::new(StaticTemplateSource::new(
    ///     Template::new().with_parameter("theme", Parameter::with_default_value("dark")),
    /// ));
    /// let server = ServerTemplate::builder().source(source).build().unwrap();
    ///
    /// server.load().await.unwrap();
    /// let config = server.evaluate(&EvaluationContext::new()).unwrap();
    /// assert_eq!(config.get_string("theme"), "dark");
    /// # });
    /// ```
    pub async fn load(&self) -> RemoteConfigResult<()> {
        let source = self.source.as_ref().ok_or(RemoteConfigError::NoSource)?;
        let template = source.fetch_template().await?;
        debug!(etag = %template.etag, "Template fetched from source");
        self.set(template)
    }

    /// Replace the cached template
    pub fn set(&self, template: Template) -> RemoteConfigResult<()> {
        template.validate()?;
        debug!(
            etag = %template.etag,
            conditions = template.conditions.len(),
            parameters = template.parameters.len(),
            "Caching template"
        );
        *self.cache.write() = Some(Arc::new(template));
        Ok(())
    }

    /// Snapshot of the cached template
    pub fn cached(&self) -> Option<Arc<Template>> {
        self.cache.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.read().is_some()
    }

    pub fn default_config(&self) -> &HashMap<String, DefaultValue> {
        &self.default_config
    }

    /// Evaluate the cached template for one client.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteConfigError::NotLoaded`] if no template has been set
    /// or loaded yet.
    pub fn evaluate(&self, context: &EvaluationContext) -> RemoteConfigResult<ResolvedConfig> {
        let template = self.cached().ok_or(RemoteConfigError::NotLoaded)?;
        Ok(TemplateConfigResolver::evaluate(
            &template,
            &self.default_config,
            context,
        ))
    }
}

impl std::fmt::Debug for ServerTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTemplate")
            .field("default_config", &self.default_config)
            .field("etag", &self.cached().map(|t| t.etag.clone()))
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// Builder for creating a ServerTemplate
#[derive(Default)]
pub struct ServerTemplateBuilder {
    default_config: HashMap<String, DefaultValue>,
    template: Option<Template>,
    source: Option<Arc<dyn TemplateSource>>,
}

impl ServerTemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole default config
    pub fn default_config(mut self, default_config: HashMap<String, DefaultValue>) -> Self {
        self.default_config = default_config;
        self
    }

    /// Add one default config entry
    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<DefaultValue>) -> Self {
        self.default_config.insert(key.into(), value.into());
        self
    }

    /// Start with a cached template
    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    /// Source used by `load()`
    pub fn source(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the server template
    pub fn build(self) -> RemoteConfigResult<ServerTemplate> {
        let server = ServerTemplate {
            default_config: self.default_config,
            cache: RwLock::new(None),
            source: self.source,
        };
        if let Some(template) = self.template {
            server.set(template)?;
        }
        Ok(server)
    }
}
