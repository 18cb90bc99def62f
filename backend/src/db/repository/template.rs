//! Repository trait for templates.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Template, TemplateId, TemplateKey};

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// The template addressed by `(organization_id, term_id, key)`.
    async fn find_template(
        &self,
        organization_id: &str,
        term_id: &str,
        key: &TemplateKey,
    ) -> RepositoryResult<Option<Template>>;

    async fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Option<Template>>;

    /// Insert or replace a template by `template_id`.
    async fn save_template(&self, template: &Template) -> RepositoryResult<()>;
}
