use std::sync::Arc;

use stepform_core::AppResult;
use stepform_domain::{FormConfigCommand, FormConfiguration, FormConfigurationInput};
use tracing::{debug, info};

use crate::form_ports::FormConfigurationRepository;

/// Application service applying edit commands to stored form configurations.
#[derive(Clone)]
pub struct FormEditorService {
    form_repository: Arc<dyn FormConfigurationRepository>,
}

impl FormEditorService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(form_repository: Arc<dyn FormConfigurationRepository>) -> Self {
        Self { form_repository }
    }

    /// Returns the stored configuration, or a fresh one named after the
    /// requirement type when none exists yet.
    pub async fn current_configuration(&self, requirement_type: &str) -> AppResult<FormConfiguration> {
        match self
            .form_repository
            .find_form_configuration(requirement_type)
            .await?
        {
            Some(configuration) => Ok(configuration),
            None => {
                debug!(requirement_type, "starting a new form configuration");
                FormConfiguration::new(FormConfigurationInput {
                    id: requirement_type.to_owned(),
                    name: requirement_type.to_owned(),
                    version: 0,
                    sections: Vec::new(),
                    fields: Vec::new(),
                    widgets: Vec::new(),
                })
            }
        }
    }

    /// Applies one command and stores the result.
    pub async fn apply_command(
        &self,
        requirement_type: &str,
        command: FormConfigCommand,
    ) -> AppResult<FormConfiguration> {
        self.apply_commands(requirement_type, vec![command]).await
    }

    /// Applies commands in order and stores the result only when all succeed.
    pub async fn apply_commands(
        &self,
        requirement_type: &str,
        commands: Vec<FormConfigCommand>,
    ) -> AppResult<FormConfiguration> {
        let mut configuration = self.current_configuration(requirement_type).await?;
        let command_count = commands.len();

        for command in commands {
            let command_name = command.command_name();
            configuration = configuration.apply(command)?;
            debug!(
                requirement_type,
                command = command_name,
                version = configuration.version(),
                "applied form command"
            );
        }

        self.form_repository
            .save_form_configuration(requirement_type, configuration.clone())
            .await?;

        info!(
            requirement_type,
            form_id = configuration.id(),
            version = configuration.version(),
            command_count,
            "saved form configuration"
        );

        Ok(configuration)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use stepform_core::{AppError, AppResult};
    use stepform_domain::{
        FieldType, FormConfigCommand, FormConfiguration, FormField, FormFieldInput,
        FormItemRef, StepBinding, WidgetType,
    };

    use super::FormEditorService;
    use crate::form_ports::FormConfigurationRepository;

    #[derive(Default)]
    struct FakeFormRepository {
        forms: Mutex<HashMap<String, FormConfiguration>>,
        saves: Mutex<usize>,
    }

    #[async_trait]
    impl FormConfigurationRepository for FakeFormRepository {
        async fn find_form_configuration(
            &self,
            requirement_type: &str,
        ) -> AppResult<Option<FormConfiguration>> {
            Ok(self.forms.lock().await.get(requirement_type).cloned())
        }

        async fn save_form_configuration(
            &self,
            requirement_type: &str,
            configuration: FormConfiguration,
        ) -> AppResult<()> {
            *self.saves.lock().await += 1;
            self.forms
                .lock()
                .await
                .insert(requirement_type.to_owned(), configuration);
            Ok(())
        }
    }

    fn text_field(id: &str) -> FormField {
        FormField::new(FormFieldInput::new(id, FieldType::Text, id, id))
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn first_command_creates_the_configuration() {
        let repository = Arc::new(FakeFormRepository::default());
        let service = FormEditorService::new(repository.clone());

        let saved = service
            .apply_command(
                "purchase",
                FormConfigCommand::AddField {
                    field: text_field("title"),
                },
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(saved.id(), "purchase");
        assert_eq!(saved.version(), 1);
        assert!(repository.forms.lock().await.contains_key("purchase"));
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let repository = Arc::new(FakeFormRepository::default());
        let service = FormEditorService::new(repository.clone());

        let result = service
            .apply_commands(
                "purchase",
                vec![
                    FormConfigCommand::AddField {
                        field: text_field("title"),
                    },
                    FormConfigCommand::AddField {
                        field: text_field("title"),
                    },
                ],
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(*repository.saves.lock().await, 0);
    }

    #[tokio::test]
    async fn commands_build_on_the_stored_configuration() {
        let repository = Arc::new(FakeFormRepository::default());
        let service = FormEditorService::new(repository);

        service
            .apply_command(
                "purchase",
                FormConfigCommand::AddWidgetFromTemplate {
                    widget_type: WidgetType::BudgetGroup,
                    section: "default".to_owned(),
                    order: 2,
                },
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        let widget_id = service
            .current_configuration("purchase")
            .await
            .unwrap_or_else(|_| unreachable!())
            .widgets()[0]
            .id()
            .to_owned();

        let updated = service
            .apply_command(
                "purchase",
                FormConfigCommand::SetBinding {
                    item: FormItemRef::Widget(widget_id.clone()),
                    binding: StepBinding::new(["s2"]),
                },
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(updated.version(), 2);
        let widget = updated.find_widget(&widget_id);
        assert!(widget.is_some_and(|widget| widget.workflow_step_binding().contains("s2")));
    }

    #[tokio::test]
    async fn deleting_unknown_field_is_not_found() {
        let service = FormEditorService::new(Arc::new(FakeFormRepository::default()));

        let result = service
            .apply_command(
                "purchase",
                FormConfigCommand::DeleteField {
                    field_id: "missing".to_owned(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
