use async_trait::async_trait;
use stepform_core::AppResult;
use stepform_domain::{FormConfiguration, WorkflowDefinition};

/// Source port for workflow definitions keyed by requirement type.
#[async_trait]
pub trait WorkflowDefinitionSource: Send + Sync {
    /// Returns the workflow for a requirement type.
    async fn find_workflow(&self, requirement_type: &str) -> AppResult<Option<WorkflowDefinition>>;
}

/// Repository port for form configurations keyed by requirement type.
#[async_trait]
pub trait FormConfigurationRepository: Send + Sync {
    /// Returns the form configuration for a requirement type.
    async fn find_form_configuration(
        &self,
        requirement_type: &str,
    ) -> AppResult<Option<FormConfiguration>>;

    /// Saves the form configuration for a requirement type, replacing any previous one.
    async fn save_form_configuration(
        &self,
        requirement_type: &str,
        configuration: FormConfiguration,
    ) -> AppResult<()>;
}
