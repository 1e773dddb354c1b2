//! Application services and ports.

#![forbid(unsafe_code)]

mod binding_resolver;
mod configuration_lint;
mod form_editor_service;
mod form_ports;
mod form_view_service;
mod light_mode;
mod parallel_grouping;
mod permission_evaluator;
mod step_view;

pub use binding_resolver::{
    ResolvedItem, ResolvedSection, ResolvedStep, StepContext, field_in_scope, resolve_step,
    resolve_with_context, widget_in_scope,
};
pub use configuration_lint::{ConfigurationLint, lint_configuration};
pub use form_editor_service::FormEditorService;
pub use form_ports::{FormConfigurationRepository, WorkflowDefinitionSource};
pub use form_view_service::{ConfigurationSnapshot, FormViewService, StepViewRequest};
pub use light_mode::{LightModeFilter, apply_light_mode};
pub use parallel_grouping::{DisplayUnit, group_parallel};
pub use permission_evaluator::{annotate_step, evaluate_permission};
pub use step_view::{FieldView, ItemView, SectionView, StepFormView, WidgetView};
