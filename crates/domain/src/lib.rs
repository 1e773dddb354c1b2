//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod binding;
mod form;
mod form_command;
mod form_field;
mod form_widget;
mod security;
mod workflow;

pub use binding::{LEGACY_FIRST_STEP_ID, StepBinding};
pub use form::{
    FormConfiguration, FormConfigurationInput, FormItem, FormItemRef, FormSection,
    FormSectionInput,
};
pub use form_command::FormConfigCommand;
pub use form_field::{
    DEFAULT_SECTION_ID, FieldOption, FieldType, FieldWidth, FormField, FormFieldInput,
};
pub use form_widget::{FormWidget, FormWidgetInput, WidgetType};
pub use security::{AccessLevel, FieldPermissions, Role, ViewerRoles};
pub use workflow::{
    EstimatedDays, ResponsibleParty, WorkflowDefinition, WorkflowDefinitionInput, WorkflowStep,
    WorkflowStepInput,
};
