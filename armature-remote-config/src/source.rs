//! Template source trait definition.

use crate::error::{RemoteConfigError, RemoteConfigResult};
use crate::template::Template;
use async_trait::async_trait;
use parking_lot::RwLock;

/// Produces templates for [`ServerTemplate::load`](crate::ServerTemplate::load).
///
/// Implementations typically fetch and decode the template from a backend.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Fetch the current template.
    ///
    /// # Returns
    ///
    /// Returns the template, or [`RemoteConfigError::Fetch`] if it could not
    /// be obtained.
    async fn fetch_template(&self) -> RemoteConfigResult<Template>;
}

/// In-memory template source
#[derive(Debug, Default)]
pub struct StaticTemplateSource {
    template: RwLock<Option<Template>>,
}

impl StaticTemplateSource {
    pub fn new(template: Template) -> Self {
        Self {
            template: RwLock::new(Some(template)),
        }
    }

    /// A source with nothing to serve; every fetch fails
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the template served by later fetches
    pub fn publish(&self, template: Template) {
        *self.template.write() = Some(template);
    }
}

#[async_trait]
impl TemplateSource for StaticTemplateSource {
    async fn fetch_template(&self) -> RemoteConfigResult<Template> {
        let template = self.template.read().clone();
        template.ok_or_else(|| RemoteConfigError::fetch("static source has no template"))
    }
}
