use std::collections::HashMap;

use async_trait::async_trait;
use stepform_application::{FormConfigurationRepository, WorkflowDefinitionSource};
use stepform_core::AppResult;
use stepform_domain::{FormConfiguration, WorkflowDefinition};
use tokio::sync::RwLock;

/// In-memory store for workflows and form configurations keyed by requirement type.
#[derive(Debug, Default)]
pub struct InMemoryConfigurationStore {
    workflows: RwLock<HashMap<String, WorkflowDefinition>>,
    forms: RwLock<HashMap<String, FormConfiguration>>,
}

impl InMemoryConfigurationStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the workflow for a requirement type, replacing any previous one.
    pub async fn save_workflow(&self, requirement_type: &str, workflow: WorkflowDefinition) {
        self.workflows
            .write()
            .await
            .insert(requirement_type.to_owned(), workflow);
    }
}

#[async_trait]
impl WorkflowDefinitionSource for InMemoryConfigurationStore {
    async fn find_workflow(&self, requirement_type: &str) -> AppResult<Option<WorkflowDefinition>> {
        Ok(self.workflows.read().await.get(requirement_type).cloned())
    }
}

#[async_trait]
impl FormConfigurationRepository for InMemoryConfigurationStore {
    async fn find_form_configuration(
        &self,
        requirement_type: &str,
    ) -> AppResult<Option<FormConfiguration>> {
        Ok(self.forms.read().await.get(requirement_type).cloned())
    }

    async fn save_form_configuration(
        &self,
        requirement_type: &str,
        configuration: FormConfiguration,
    ) -> AppResult<()> {
        self.forms
            .write()
            .await
            .insert(requirement_type.to_owned(), configuration);
        Ok(())
    }
}
