use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stepform_core::{AppError, AppResult, NonEmptyString};

use crate::binding::StepBinding;
use crate::form_field::{
    FieldOption, FieldType, FieldWidth, FormField, FormFieldInput, default_section,
};
use crate::security::FieldPermissions;

/// Supported widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    /// Start and end date pair.
    DateGroup,
    /// Budget amount and cost center.
    BudgetGroup,
    /// Owner and deputy assignment.
    ResponsibilityGroup,
    /// Approval decision with comment.
    ApprovalGroup,
    /// Free-form group without template fields.
    Custom,
}

impl WidgetType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateGroup => "date-group",
            Self::BudgetGroup => "budget-group",
            Self::ResponsibilityGroup => "responsibility-group",
            Self::ApprovalGroup => "approval-group",
            Self::Custom => "custom",
        }
    }

    /// Returns the default title for a widget of this type.
    #[must_use]
    pub fn default_title(&self) -> &'static str {
        match self {
            Self::DateGroup => "Schedule",
            Self::BudgetGroup => "Budget",
            Self::ResponsibilityGroup => "Responsibility",
            Self::ApprovalGroup => "Approval",
            Self::Custom => "Group",
        }
    }

    /// Builds the template fields for a new widget of this type.
    ///
    /// Field ids are derived from the widget id so they stay unique per widget.
    pub fn template_fields(&self, widget_id: &str, section: &str) -> AppResult<Vec<FormField>> {
        let specs: &[(&str, FieldType, &str, FieldWidth)] = match self {
            Self::DateGroup => &[
                ("start_date", FieldType::Date, "Start date", FieldWidth::Half),
                ("end_date", FieldType::Date, "End date", FieldWidth::Half),
            ],
            Self::BudgetGroup => &[
                ("amount", FieldType::Currency, "Amount", FieldWidth::Half),
                ("cost_center", FieldType::Text, "Cost center", FieldWidth::Half),
            ],
            Self::ResponsibilityGroup => &[
                ("owner", FieldType::UserReferenceSearch, "Owner", FieldWidth::Half),
                ("deputy", FieldType::UserReferenceSearch, "Deputy", FieldWidth::Half),
            ],
            Self::ApprovalGroup => &[
                ("decision", FieldType::Select, "Decision", FieldWidth::Half),
                ("comment", FieldType::Textarea, "Comment", FieldWidth::Full),
            ],
            Self::Custom => &[],
        };

        specs
            .iter()
            .zip(1..)
            .map(|((name, field_type, label, width), order)| {
                let mut input = FormFieldInput::new(
                    format!("{widget_id}-{name}"),
                    *field_type,
                    *name,
                    *label,
                );
                input.width = *width;
                input.section = section.to_owned();
                input.widget_id = Some(widget_id.to_owned());
                input.order = order;
                if field_type.is_choice() {
                    input.options = vec![
                        FieldOption::new("approved", "Approved"),
                        FieldOption::new("rejected", "Rejected"),
                    ];
                }
                FormField::new(input)
            })
            .collect()
    }
}

impl FromStr for WidgetType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "date-group" => Ok(Self::DateGroup),
            "budget-group" => Ok(Self::BudgetGroup),
            "responsibility-group" => Ok(Self::ResponsibilityGroup),
            "approval-group" => Ok(Self::ApprovalGroup),
            "custom" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!(
                "unknown widget type '{value}'"
            ))),
        }
    }
}

/// Input payload used to construct a validated widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormWidgetInput {
    /// Widget id, unique within the configuration.
    pub id: String,
    /// Widget kind.
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    /// Display title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Section id, or `"default"`.
    #[serde(default = "default_section")]
    pub section: String,
    /// Sort key within the section.
    #[serde(default)]
    pub order: i32,
    /// Whether the widget can be collapsed.
    #[serde(default)]
    pub collapsible: bool,
    /// Whether the widget starts collapsed.
    #[serde(default)]
    pub collapsed: bool,
    /// Steps the widget is bound to; empty means every step.
    #[serde(default)]
    pub workflow_step_binding: StepBinding,
    /// Optional role rules gating the whole widget.
    #[serde(default)]
    pub permissions: Option<FieldPermissions>,
    /// Contained fields.
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl FormWidgetInput {
    /// Creates an input with defaults for every optional attribute.
    #[must_use]
    pub fn new(id: impl Into<String>, widget_type: WidgetType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            widget_type,
            title: title.into(),
            description: None,
            section: default_section(),
            order: 0,
            collapsible: false,
            collapsed: false,
            workflow_step_binding: StepBinding::unbound(),
            permissions: None,
            fields: Vec::new(),
        }
    }
}

/// Named group of fields rendered and bound together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FormWidgetInput")]
pub struct FormWidget {
    id: NonEmptyString,
    #[serde(rename = "type")]
    widget_type: WidgetType,
    title: NonEmptyString,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    section: NonEmptyString,
    order: i32,
    collapsible: bool,
    collapsed: bool,
    workflow_step_binding: StepBinding,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<FieldPermissions>,
    fields: Vec<FormField>,
}

impl FormWidget {
    /// Creates a validated widget.
    ///
    /// Every contained field must name this widget in its `widgetId`.
    pub fn new(input: FormWidgetInput) -> AppResult<Self> {
        let FormWidgetInput {
            id,
            widget_type,
            title,
            description,
            section,
            order,
            collapsible,
            collapsed,
            workflow_step_binding,
            permissions,
            fields,
        } = input;

        let id = NonEmptyString::named("widget id", id)?;

        for field in &fields {
            if field.widget_id() != Some(id.as_str()) {
                return Err(AppError::Validation(format!(
                    "field '{}' in widget '{}' has widgetId '{}'",
                    field.id(),
                    id.as_str(),
                    field.widget_id().unwrap_or("<none>")
                )));
            }
        }

        let section = if section.trim().is_empty() {
            default_section()
        } else {
            section
        };

        Ok(Self {
            widget_type,
            title: NonEmptyString::named("widget title", title)?,
            description: description.and_then(|value| {
                let trimmed = value.trim().to_owned();
                (!trimmed.is_empty()).then_some(trimmed)
            }),
            section: NonEmptyString::named("widget section", section)?,
            order,
            collapsible,
            collapsed,
            workflow_step_binding,
            permissions,
            fields,
            id,
        })
    }

    /// Creates a widget pre-populated with the template fields of its type.
    pub fn from_template(
        id: impl Into<String>,
        widget_type: WidgetType,
        section: impl Into<String>,
        order: i32,
    ) -> AppResult<Self> {
        let id = id.into();
        let section = section.into();
        let mut input = FormWidgetInput::new(id.clone(), widget_type, widget_type.default_title());
        input.fields = widget_type.template_fields(id.as_str(), section.as_str())?;
        input.section = section;
        input.order = order;
        input.collapsible = true;
        Self::new(input)
    }

    /// Returns an editable copy of this widget's attributes.
    #[must_use]
    pub fn to_input(&self) -> FormWidgetInput {
        FormWidgetInput {
            id: self.id.as_str().to_owned(),
            widget_type: self.widget_type,
            title: self.title.as_str().to_owned(),
            description: self.description.clone(),
            section: self.section.as_str().to_owned(),
            order: self.order,
            collapsible: self.collapsible,
            collapsed: self.collapsed,
            workflow_step_binding: self.workflow_step_binding.clone(),
            permissions: self.permissions.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Returns widget id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns widget kind.
    #[must_use]
    pub fn widget_type(&self) -> WidgetType {
        self.widget_type
    }

    /// Returns display title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns section id.
    #[must_use]
    pub fn section(&self) -> &str {
        self.section.as_str()
    }

    /// Returns sort key.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns whether the widget can be collapsed.
    #[must_use]
    pub fn collapsible(&self) -> bool {
        self.collapsible
    }

    /// Returns whether the widget starts collapsed.
    #[must_use]
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// Returns step binding.
    #[must_use]
    pub fn workflow_step_binding(&self) -> &StepBinding {
        &self.workflow_step_binding
    }

    /// Returns optional role rules.
    #[must_use]
    pub fn permissions(&self) -> Option<&FieldPermissions> {
        self.permissions.as_ref()
    }

    /// Returns contained fields in authoring order.
    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Returns contained fields sorted by `order`, ties kept in authoring order.
    #[must_use]
    pub fn sorted_fields(&self) -> Vec<&FormField> {
        let mut fields: Vec<&FormField> = self.fields.iter().collect();
        fields.sort_by_key(|field| field.order());
        fields
    }

    /// Returns a copy whose fields are sorted by `order`.
    #[must_use]
    pub fn with_sorted_fields(&self) -> Self {
        let mut widget = self.clone();
        widget.fields.sort_by_key(FormField::order);
        widget
    }

    /// Returns a copy keeping only the fields matching the predicate.
    ///
    /// A subset of valid widget fields is still valid, so this cannot fail.
    #[must_use]
    pub fn with_fields_filtered(&self, mut keep: impl FnMut(&FormField) -> bool) -> Self {
        let mut widget = self.clone();
        widget.fields.retain(|field| keep(field));
        widget
    }
}

impl TryFrom<FormWidgetInput> for FormWidget {
    type Error = AppError;

    fn try_from(value: FormWidgetInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
