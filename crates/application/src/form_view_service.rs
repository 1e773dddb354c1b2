use std::sync::Arc;

use stepform_core::{AppError, AppResult};
use stepform_domain::{FormConfiguration, ViewerRoles, WorkflowDefinition};
use tracing::{debug, warn};

use crate::binding_resolver::{StepContext, resolve_with_context};
use crate::configuration_lint::{ConfigurationLint, lint_configuration};
use crate::form_ports::{FormConfigurationRepository, WorkflowDefinitionSource};
use crate::light_mode::apply_light_mode;
use crate::parallel_grouping::{DisplayUnit, group_parallel};
use crate::permission_evaluator::annotate_step;
use crate::step_view::StepFormView;


/// What to render for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepViewRequest {
    /// Step to render; `None` renders the first step.
    pub step_id: Option<String>,
    /// Roles of the viewer.
    pub viewer: ViewerRoles,
    /// Whether to narrow to light-mode fields.
    pub light_mode: bool,
    /// Whether hidden items stay in the view, annotated as hidden.
    pub include_hidden: bool,
}

impl StepViewRequest {
    /// Creates a request for a step with light mode off and hidden items dropped.
    #[must_use]
    pub fn new(step_id: impl Into<String>, viewer: ViewerRoles) -> Self {
        Self {
            step_id: Some(step_id.into()),
            viewer,
            light_mode: false,
            include_hidden: false,
        }
    }
}

/// Fully loaded workflow and form configuration of one requirement type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSnapshot {
    workflow: WorkflowDefinition,
    form: FormConfiguration,
}

impl ConfigurationSnapshot {
    /// Creates a snapshot from a consistent pair.
    #[must_use]
    pub fn new(workflow: WorkflowDefinition, form: FormConfiguration) -> Self {
        Self { workflow, form }
    }

    /// Returns the workflow.
    #[must_use]
    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    /// Returns the form configuration.
    #[must_use]
    pub fn form(&self) -> &FormConfiguration {
        &self.form
    }

    /// Groups the workflow steps for display.
    #[must_use]
    pub fn outline(&self) -> Vec<DisplayUnit> {
        group_parallel(&self.workflow)
    }

    /// Lists authoring problems of the form configuration.
    #[must_use]
    pub fn lints(&self) -> Vec<ConfigurationLint> {
        lint_configuration(&self.workflow, &self.form)
    }

    /// Resolves, annotates and filters the form of one step.
    ///
    /// Fails only when no step is named and the workflow has no first step.
    pub fn step_view(&self, request: &StepViewRequest) -> AppResult<StepFormView> {
        let step_id = match request.step_id.as_deref() {
            Some(step_id) => step_id,
            None => self
                .workflow
                .first_steps()
                .next()
                .map(|step| step.id())
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "workflow '{}' has no first step to render",
                        self.workflow.id()
                    ))
                })?,
        };

        let context = StepContext::for_workflow(&self.workflow, step_id);
        let resolved = resolve_with_context(&self.form, context);
        let view = apply_light_mode(annotate_step(&resolved, &request.viewer), request.light_mode);

        if request.include_hidden {
            return Ok(view);
        }

        Ok(view.without_hidden())
    }
}

/// Application service answering step form queries for a requirement type.
#[derive(Clone)]
pub struct FormViewService {
    workflow_source: Arc<dyn WorkflowDefinitionSource>,
    form_repository: Arc<dyn FormConfigurationRepository>,
}

impl FormViewService {
    /// Creates a service from port implementations.
    #[must_use]
    pub fn new(
        workflow_source: Arc<dyn WorkflowDefinitionSource>,
        form_repository: Arc<dyn FormConfigurationRepository>,
    ) -> Self {
        Self {
            workflow_source,
            form_repository,
        }
    }

    /// Loads the workflow and form configuration of a requirement type.
    ///
    /// A missing workflow is an error; a missing form configuration is
    /// replaced by an empty one.
    pub async fn load_snapshot(&self, requirement_type: &str) -> AppResult<ConfigurationSnapshot> {
        let workflow = self
            .workflow_source
            .find_workflow(requirement_type)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no workflow configured for requirement type '{requirement_type}'"
                ))
            })?;

        let form = match self
            .form_repository
            .find_form_configuration(requirement_type)
            .await?
        {
            Some(form) => form,
            None => {
                debug!(
                    requirement_type,
                    "no form configuration found, using an empty one"
                );
                FormConfiguration::empty()
            }
        };

        debug!(
            requirement_type,
            workflow_id = workflow.id(),
            form_id = form.id(),
            form_version = form.version(),
            step_count = workflow.steps().len(),
            "loaded configuration snapshot"
        );

        Ok(ConfigurationSnapshot::new(workflow, form))
    }

    /// Renders the form of one step for one viewer.
    pub async fn render_step(
        &self,
        requirement_type: &str,
        request: &StepViewRequest,
    ) -> AppResult<StepFormView> {
        let snapshot = self.load_snapshot(requirement_type).await?;

        if let Some(step_id) = request.step_id.as_deref()
            && snapshot.workflow().find_step(step_id).is_none()
        {
            warn!(
                requirement_type,
                step_id, "rendering a step that is not part of the workflow"
            );
        }

        snapshot.step_view(request)
    }

    /// Returns the workflow grouped into display units.
    pub async fn workflow_outline(&self, requirement_type: &str) -> AppResult<Vec<DisplayUnit>> {
        let workflow = self
            .workflow_source
            .find_workflow(requirement_type)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no workflow configured for requirement type '{requirement_type}'"
                ))
            })?;

        Ok(group_parallel(&workflow))
    }

    /// Lists authoring problems of the requirement type's form configuration.
    pub async fn lint(&self, requirement_type: &str) -> AppResult<Vec<ConfigurationLint>> {
        let lints = self.load_snapshot(requirement_type).await?.lints();
        if !lints.is_empty() {
            debug!(
                requirement_type,
                lint_count = lints.len(),
                "form configuration has lint findings"
            );
        }

        Ok(lints)
    }
}
