use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stepform_core::{AppError, AppResult, NonEmptyString};

use crate::binding::StepBinding;
use crate::security::FieldPermissions;

/// Section id used by fields and widgets that were never assigned a section.
pub const DEFAULT_SECTION_ID: &str = "default";

/// Supported form field input types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Textarea,
    /// Plain number.
    Number,
    /// Monetary amount.
    Currency,
    /// Calendar date.
    Date,
    /// Single choice from a drop-down.
    Select,
    /// Multiple choices from a list.
    MultiSelect,
    /// Single choice from radio buttons.
    Radio,
    /// Boolean tick box.
    Checkbox,
    /// Search for a user account.
    UserReferenceSearch,
    /// Search for another record.
    RecordReferenceSearch,
}

impl FieldType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Currency => "currency",
            Self::Date => "date",
            Self::Select => "select",
            Self::MultiSelect => "multi-select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::UserReferenceSearch => "user-reference-search",
            Self::RecordReferenceSearch => "record-reference-search",
        }
    }

    /// Returns whether the type picks values from a fixed option list.
    #[must_use]
    pub fn is_choice(&self) -> bool {
        match self {
            Self::Select | Self::MultiSelect | Self::Radio => true,
            Self::Text
            | Self::Textarea
            | Self::Number
            | Self::Currency
            | Self::Date
            | Self::Checkbox
            | Self::UserReferenceSearch
            | Self::RecordReferenceSearch => false,
        }
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "textarea" => Ok(Self::Textarea),
            "number" => Ok(Self::Number),
            "currency" => Ok(Self::Currency),
            "date" => Ok(Self::Date),
            "select" => Ok(Self::Select),
            "multi-select" => Ok(Self::MultiSelect),
            "radio" => Ok(Self::Radio),
            "checkbox" => Ok(Self::Checkbox),
            "user-reference-search" => Ok(Self::UserReferenceSearch),
            "record-reference-search" => Ok(Self::RecordReferenceSearch),
            _ => Err(AppError::Validation(format!(
                "unknown field type '{value}'"
            ))),
        }
    }
}

/// Layout width hint for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldWidth {
    /// Whole row.
    #[default]
    Full,
    /// One half of a row.
    Half,
    /// One third of a row.
    Third,
    /// One quarter of a row.
    Quarter,
}

/// One choice of a select, multi-select or radio field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Stored value, unique within the field.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FieldOption {
    /// Creates an option.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Input payload used to construct a validated form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldInput {
    /// Field id, unique within the configuration.
    pub id: String,
    /// Input type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Machine key.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Whether a value is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Layout width.
    #[serde(default)]
    pub width: FieldWidth,
    /// Section id, or `"default"`.
    #[serde(default = "default_section")]
    pub section: String,
    /// Owning widget id, set only for fields inside a widget.
    #[serde(default)]
    pub widget_id: Option<String>,
    /// Steps the field is bound to; empty means every step.
    #[serde(default)]
    pub workflow_step_binding: StepBinding,
    /// Whether the field is part of the abbreviated light-mode form.
    #[serde(default)]
    pub light_mode_visible: bool,
    /// Optional role rules.
    #[serde(default)]
    pub permissions: Option<FieldPermissions>,
    /// Sort key within the section or widget.
    #[serde(default)]
    pub order: i32,
    /// Choices for choice-type fields.
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// Optional placeholder text.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Optional help text shown below the control.
    #[serde(default)]
    pub help_text: Option<String>,
}

impl FormFieldInput {
    /// Creates an input with defaults for every optional attribute.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        field_type: FieldType,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            field_type,
            name: name.into(),
            label: label.into(),
            required: false,
            width: FieldWidth::Full,
            section: default_section(),
            widget_id: None,
            workflow_step_binding: StepBinding::unbound(),
            light_mode_visible: false,
            permissions: None,
            order: 0,
            options: Vec::new(),
            placeholder: None,
            help_text: None,
        }
    }
}

pub(crate) fn default_section() -> String {
    DEFAULT_SECTION_ID.to_owned()
}

/// A single input field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FormFieldInput")]
pub struct FormField {
    id: NonEmptyString,
    #[serde(rename = "type")]
    field_type: FieldType,
    name: NonEmptyString,
    label: NonEmptyString,
    required: bool,
    width: FieldWidth,
    section: NonEmptyString,
    #[serde(skip_serializing_if = "Option::is_none")]
    widget_id: Option<NonEmptyString>,
    workflow_step_binding: StepBinding,
    light_mode_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<FieldPermissions>,
    order: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help_text: Option<String>,
}

impl FormField {
    /// Creates a validated form field.
    pub fn new(input: FormFieldInput) -> AppResult<Self> {
        let FormFieldInput {
            id,
            field_type,
            name,
            label,
            required,
            width,
            section,
            widget_id,
            workflow_step_binding,
            light_mode_visible,
            permissions,
            order,
            options,
            placeholder,
            help_text,
        } = input;

        let id = NonEmptyString::named("field id", id)?;
        validate_options(id.as_str(), field_type, &options)?;

        let section = if section.trim().is_empty() {
            default_section()
        } else {
            section
        };

        Ok(Self {
            field_type,
            name: NonEmptyString::named("field name", name)?,
            label: NonEmptyString::named("field label", label)?,
            required,
            width,
            section: NonEmptyString::named("field section", section)?,
            widget_id: widget_id
                .map(|value| NonEmptyString::named("field widgetId", value))
                .transpose()?,
            workflow_step_binding,
            light_mode_visible,
            permissions,
            order,
            options,
            placeholder: trimmed_text(placeholder),
            help_text: trimmed_text(help_text),
            id,
        })
    }

    /// Returns an editable copy of this field's attributes.
    #[must_use]
    pub fn to_input(&self) -> FormFieldInput {
        FormFieldInput {
            id: self.id.as_str().to_owned(),
            field_type: self.field_type,
            name: self.name.as_str().to_owned(),
            label: self.label.as_str().to_owned(),
            required: self.required,
            width: self.width,
            section: self.section.as_str().to_owned(),
            widget_id: self.widget_id().map(str::to_owned),
            workflow_step_binding: self.workflow_step_binding.clone(),
            light_mode_visible: self.light_mode_visible,
            permissions: self.permissions.clone(),
            order: self.order,
            options: self.options.clone(),
            placeholder: self.placeholder.clone(),
            help_text: self.help_text.clone(),
        }
    }

    /// Returns field id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns field input type.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns machine key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns whether a value is mandatory.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Returns layout width.
    #[must_use]
    pub fn width(&self) -> FieldWidth {
        self.width
    }

    /// Returns section id.
    #[must_use]
    pub fn section(&self) -> &str {
        self.section.as_str()
    }

    /// Returns owning widget id.
    #[must_use]
    pub fn widget_id(&self) -> Option<&str> {
        self.widget_id.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns step binding.
    #[must_use]
    pub fn workflow_step_binding(&self) -> &StepBinding {
        &self.workflow_step_binding
    }

    /// Returns whether the field shows in light mode.
    #[must_use]
    pub fn light_mode_visible(&self) -> bool {
        self.light_mode_visible
    }

    /// Returns optional role rules.
    #[must_use]
    pub fn permissions(&self) -> Option<&FieldPermissions> {
        self.permissions.as_ref()
    }

    /// Returns sort key.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns choices.
    #[must_use]
    pub fn options(&self) -> &[FieldOption] {
        &self.options
    }

    /// Returns placeholder text.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Returns help text.
    #[must_use]
    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }
}

impl TryFrom<FormFieldInput> for FormField {
    type Error = AppError;

    fn try_from(value: FormFieldInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn validate_options(field_id: &str, field_type: FieldType, options: &[FieldOption]) -> AppResult<()> {
    if !field_type.is_choice() {
        if !options.is_empty() {
            return Err(AppError::Validation(format!(
                "field '{field_id}' of type '{}' does not accept options",
                field_type.as_str()
            )));
        }

        return Ok(());
    }

    if options.is_empty() {
        return Err(AppError::Validation(format!(
            "field '{field_id}' of type '{}' requires at least one option",
            field_type.as_str()
        )));
    }

    let mut seen_values = HashSet::new();
    for option in options {
        if option.value.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "field '{field_id}' contains an option with an empty value"
            )));
        }
        if !seen_values.insert(option.value.as_str()) {
            return Err(AppError::Validation(format!(
                "field '{field_id}' contains duplicate option value '{}'",
                option.value
            )));
        }
    }

    Ok(())
}

fn trimmed_text(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{DEFAULT_SECTION_ID, FieldOption, FieldType, FormField, FormFieldInput};

    #[test]
    fn field_type_roundtrip_storage_value() {
        let field_type = FieldType::UserReferenceSearch;
        let restored = FieldType::from_str(field_type.as_str());
        assert_eq!(restored.unwrap_or(FieldType::Text), field_type);
        assert!(FieldType::from_str("rich-text").is_err());
    }

    #[test]
    fn choice_fields_require_options() {
        let input = FormFieldInput::new("decision", FieldType::Select, "decision", "Decision");
        assert!(FormField::new(input).is_err());
    }

    #[test]
    fn non_choice_fields_reject_options() {
        let mut input = FormFieldInput::new("title", FieldType::Text, "title", "Title");
        input.options = vec![FieldOption::new("a", "A")];
        assert!(FormField::new(input).is_err());
    }

    #[test]
    fn option_values_must_be_unique() {
        let mut input = FormFieldInput::new("decision", FieldType::Radio, "decision", "Decision");
        input.options = vec![
            FieldOption::new("yes", "Yes"),
            FieldOption::new("yes", "Also yes"),
        ];
        assert!(FormField::new(input).is_err());
    }

    #[test]
    fn blank_section_falls_back_to_default() {
        let mut input = FormFieldInput::new("title", FieldType::Text, "title", "Title");
        input.section = "  ".to_owned();
        let field = FormField::new(input).unwrap_or_else(|_| unreachable!());
        assert_eq!(field.section(), DEFAULT_SECTION_ID);
    }

    #[test]
    fn field_deserializes_from_camel_case_json() {
        let parsed: Result<FormField, _> = serde_json::from_value(serde_json::json!({
            "id": "f-1",
            "type": "currency",
            "name": "budget",
            "label": "Budget",
            "width": "half",
            "section": "costs",
            "workflowStepBinding": ["step-1", "wf-2"],
            "lightModeVisible": true,
            "permissions": {"readOnlyRoles": ["Viewer"]},
            "order": 3
        }));
        assert!(parsed.is_ok());
        let field = parsed.unwrap_or_else(|_| unreachable!());
        assert_eq!(field.field_type(), FieldType::Currency);
        assert_eq!(field.workflow_step_binding().step_ids().len(), 2);
        assert!(field.light_mode_visible());
        assert!(field.permissions().is_some());

        let value = serde_json::to_value(&field).unwrap_or_default();
        assert_eq!(value["workflowStepBinding"], serde_json::json!(["step-1", "wf-2"]));
        assert_eq!(
            value["permissions"]["readOnlyRoles"],
            serde_json::json!(["Viewer"])
        );
    }
}
