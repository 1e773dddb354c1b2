use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use stepform_core::{AppError, AppResult, NonEmptyString};

use crate::binding::StepBinding;
use crate::form_field::FormField;
use crate::form_widget::FormWidget;
use crate::security::FieldPermissions;

/// Input payload used to construct a validated form section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSectionInput {
    /// Section id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Sort key among sections.
    #[serde(default)]
    pub order: i32,
    /// Optional role rules gating every item in the section.
    #[serde(default)]
    pub permissions: Option<FieldPermissions>,
}

/// Display grouping of fields and widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FormSectionInput")]
pub struct FormSection {
    id: NonEmptyString,
    title: NonEmptyString,
    order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<FieldPermissions>,
}

impl FormSection {
    /// Creates a validated form section.
    pub fn new(input: FormSectionInput) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::named("section id", input.id)?,
            title: NonEmptyString::named("section title", input.title)?,
            order: input.order,
            permissions: input.permissions,
        })
    }

    /// Returns section id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns display title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns sort key.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns optional role rules.
    #[must_use]
    pub fn permissions(&self) -> Option<&FieldPermissions> {
        self.permissions.as_ref()
    }
}

impl TryFrom<FormSectionInput> for FormSection {
    type Error = AppError;

    fn try_from(value: FormSectionInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Borrowed view of one top-level form item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormItem<'a> {
    /// Field that does not belong to a widget.
    StandaloneField(&'a FormField),
    /// Widget with its contained fields.
    Widget(&'a FormWidget),
}

impl<'a> FormItem<'a> {
    /// Returns item id.
    #[must_use]
    pub fn id(&self) -> &'a str {
        match self {
            Self::StandaloneField(field) => field.id(),
            Self::Widget(widget) => widget.id(),
        }
    }

    /// Returns section id.
    #[must_use]
    pub fn section(&self) -> &'a str {
        match self {
            Self::StandaloneField(field) => field.section(),
            Self::Widget(widget) => widget.section(),
        }
    }

    /// Returns sort key.
    #[must_use]
    pub fn order(&self) -> i32 {
        match self {
            Self::StandaloneField(field) => field.order(),
            Self::Widget(widget) => widget.order(),
        }
    }

    /// Returns step binding.
    #[must_use]
    pub fn workflow_step_binding(&self) -> &'a StepBinding {
        match self {
            Self::StandaloneField(field) => field.workflow_step_binding(),
            Self::Widget(widget) => widget.workflow_step_binding(),
        }
    }

    /// Returns optional role rules.
    #[must_use]
    pub fn permissions(&self) -> Option<&'a FieldPermissions> {
        match self {
            Self::StandaloneField(field) => field.permissions(),
            Self::Widget(widget) => widget.permissions(),
        }
    }

    /// Returns an owned reference to this item.
    #[must_use]
    pub fn to_ref(&self) -> FormItemRef {
        match self {
            Self::StandaloneField(field) => FormItemRef::Field(field.id().to_owned()),
            Self::Widget(widget) => FormItemRef::Widget(widget.id().to_owned()),
        }
    }
}

/// Owned id reference to a field (standalone or inside a widget) or a widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FormItemRef {
    /// Field id.
    Field(String),
    /// Widget id.
    Widget(String),
}

impl FormItemRef {
    /// Returns referenced id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Field(id) | Self::Widget(id) => id.as_str(),
        }
    }
}

/// Input payload used to construct a validated form configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfigurationInput {
    /// Configuration id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Authoring version counter.
    #[serde(default)]
    pub version: u32,
    /// Sections.
    #[serde(default)]
    pub sections: Vec<FormSection>,
    /// Fields that do not belong to a widget.
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// Widgets with their fields.
    #[serde(default)]
    pub widgets: Vec<FormWidget>,
}

/// Immutable form configuration of one requirement type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FormConfigurationInput")]
pub struct FormConfiguration {
    id: String,
    name: String,
    version: u32,
    sections: Vec<FormSection>,
    fields: Vec<FormField>,
    widgets: Vec<FormWidget>,
}

impl FormConfiguration {
    /// Id used for the configuration that stands in for an absent one.
    pub const EMPTY_ID: &'static str = "empty";

    /// Creates a validated form configuration.
    pub fn new(input: FormConfigurationInput) -> AppResult<Self> {
        let FormConfigurationInput {
            id,
            name,
            version,
            sections,
            fields,
            widgets,
        } = input;

        validate_structure(&sections, &fields, &widgets)?;

        Ok(Self {
            id: NonEmptyString::named("form configuration id", id)?.into(),
            name: NonEmptyString::named("form configuration name", name)?.into(),
            version,
            sections,
            fields,
            widgets,
        })
    }

    /// Returns the configuration used when none exists for a requirement type.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: Self::EMPTY_ID.to_owned(),
            name: "Empty form".to_owned(),
            version: 0,
            sections: Vec::new(),
            fields: Vec::new(),
            widgets: Vec::new(),
        }
    }

    /// Returns an editable copy of this configuration's attributes.
    #[must_use]
    pub fn to_input(&self) -> FormConfigurationInput {
        FormConfigurationInput {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version,
            sections: self.sections.clone(),
            fields: self.fields.clone(),
            widgets: self.widgets.clone(),
        }
    }

    /// Returns configuration id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns authoring version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns sections in authoring order.
    #[must_use]
    pub fn sections(&self) -> &[FormSection] {
        &self.sections
    }

    /// Returns standalone fields in authoring order.
    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Returns widgets in authoring order.
    #[must_use]
    pub fn widgets(&self) -> &[FormWidget] {
        &self.widgets
    }

    /// Returns whether the configuration defines no fields or widgets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.widgets.is_empty()
    }

    /// Returns one section by id.
    #[must_use]
    pub fn find_section(&self, section_id: &str) -> Option<&FormSection> {
        self.sections.iter().find(|section| section.id() == section_id)
    }

    /// Returns one widget by id.
    #[must_use]
    pub fn find_widget(&self, widget_id: &str) -> Option<&FormWidget> {
        self.widgets.iter().find(|widget| widget.id() == widget_id)
    }

    /// Returns one field by id, searching standalone fields and widget fields.
    #[must_use]
    pub fn find_field(&self, field_id: &str) -> Option<&FormField> {
        self.fields
            .iter()
            .chain(self.widgets.iter().flat_map(|widget| widget.fields()))
            .find(|field| field.id() == field_id)
    }

    /// Iterates top-level items: standalone fields first, then widgets.
    pub fn items(&self) -> impl Iterator<Item = FormItem<'_>> {
        self.fields
            .iter()
            .map(FormItem::StandaloneField)
            .chain(self.widgets.iter().map(FormItem::Widget))
    }
}

impl TryFrom<FormConfigurationInput> for FormConfiguration {
    type Error = AppError;

    fn try_from(value: FormConfigurationInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn validate_structure(
    sections: &[FormSection],
    fields: &[FormField],
    widgets: &[FormWidget],
) -> AppResult<()> {
    let mut seen_sections = HashSet::new();
    for section in sections {
        if !seen_sections.insert(section.id()) {
            return Err(AppError::Validation(format!(
                "duplicate section id '{}'",
                section.id()
            )));
        }
    }

    let mut seen_widgets = HashSet::new();
    for widget in widgets {
        if !seen_widgets.insert(widget.id()) {
            return Err(AppError::Validation(format!(
                "duplicate widget id '{}'",
                widget.id()
            )));
        }
    }

    for field in fields {
        match field.widget_id() {
            None => {}
            Some(widget_id) if seen_widgets.contains(widget_id) => {
                return Err(AppError::Validation(format!(
                    "field '{}' belongs to widget '{widget_id}' and cannot be standalone",
                    field.id()
                )));
            }
            Some(widget_id) => {
                return Err(AppError::Validation(format!(
                    "field '{}' references unknown widget '{widget_id}'",
                    field.id()
                )));
            }
        }
    }

    let mut seen_fields = HashSet::new();
    let all_fields = fields
        .iter()
        .chain(widgets.iter().flat_map(|widget| widget.fields()));
    for field in all_fields {
        if !seen_fields.insert(field.id()) {
            return Err(AppError::Validation(format!(
                "duplicate field id '{}'",
                field.id()
            )));
        }
    }

    Ok(())
}
