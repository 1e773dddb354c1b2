use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use stepform_application::{FormConfigurationRepository, WorkflowDefinitionSource};
use stepform_core::{AppError, AppResult};
use stepform_domain::{FormConfiguration, WorkflowDefinition};
use tracing::{debug, info};


const WORKFLOW_FILE_NAME: &str = "workflow.json";
const FORM_FILE_NAME: &str = "form.json";

/// File-backed store reading `<root>/<requirement type>/workflow.json` and
/// `<root>/<requirement type>/form.json`.
#[derive(Debug, Clone)]
pub struct JsonFileConfigurationStore {
    root: PathBuf,
}

impl JsonFileConfigurationStore {
    /// Creates a store rooted at a configuration directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the configuration directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn requirement_dir(&self, requirement_type: &str) -> AppResult<PathBuf> {
        let is_safe = !requirement_type.is_empty()
            && requirement_type
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_'));
        if !is_safe {
            return Err(AppError::Validation(format!(
                "requirement type '{requirement_type}' may only contain letters, digits, '-' and '_'"
            )));
        }

        Ok(self.root.join(requirement_type))
    }

    /// Writes the workflow for a requirement type, replacing any previous file.
    pub async fn save_workflow(
        &self,
        requirement_type: &str,
        workflow: &WorkflowDefinition,
    ) -> AppResult<()> {
        let path = self.requirement_dir(requirement_type)?.join(WORKFLOW_FILE_NAME);
        write_json(&path, workflow).await?;

        info!(
            requirement_type,
            workflow_id = workflow.id(),
            path = %path.display(),
            "saved workflow definition"
        );
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<Option<T>> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "configuration file not found");
            return Ok(None);
        }
        Err(error) => {
            return Err(AppError::Internal(format!(
                "failed to read '{}': {error}",
                path.display()
            )));
        }
    };

    serde_json::from_slice(&contents).map(Some).map_err(|error| {
        AppError::Validation(format!("invalid configuration in '{}': {error}", path.display()))
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let contents = serde_json::to_vec_pretty(value).map_err(|error| {
        AppError::Internal(format!("failed to serialize '{}': {error}", path.display()))
    })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to create directory '{}': {error}",
                parent.display()
            ))
        })?;
    }

    tokio::fs::write(path, contents).await.map_err(|error| {
        AppError::Internal(format!("failed to write '{}': {error}", path.display()))
    })
}

#[async_trait]
impl WorkflowDefinitionSource for JsonFileConfigurationStore {
    async fn find_workflow(&self, requirement_type: &str) -> AppResult<Option<WorkflowDefinition>> {
        let path = self.requirement_dir(requirement_type)?.join(WORKFLOW_FILE_NAME);
        read_json(&path).await
    }
}

#[async_trait]
impl FormConfigurationRepository for JsonFileConfigurationStore {
    async fn find_form_configuration(
        &self,
        requirement_type: &str,
    ) -> AppResult<Option<FormConfiguration>> {
        let path = self.requirement_dir(requirement_type)?.join(FORM_FILE_NAME);
        read_json(&path).await
    }

    async fn save_form_configuration(
        &self,
        requirement_type: &str,
        configuration: FormConfiguration,
    ) -> AppResult<()> {
        let path = self.requirement_dir(requirement_type)?.join(FORM_FILE_NAME);
        write_json(&path, &configuration).await?;

        info!(
            requirement_type,
            form_id = configuration.id(),
            version = configuration.version(),
            path = %path.display(),
            "saved form configuration"
        );
        Ok(())
    }
}
