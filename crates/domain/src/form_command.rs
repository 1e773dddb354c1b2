use serde::{Deserialize, Serialize};
use stepform_core::{AppError, AppResult};
use uuid::Uuid;

use crate::binding::StepBinding;
use crate::form::{FormConfiguration, FormConfigurationInput, FormItemRef, FormSection};
use crate::form_field::{DEFAULT_SECTION_ID, FormField};
use crate::form_widget::{FormWidget, WidgetType};

/// One edit applied to a form configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum FormConfigCommand {
    /// Adds a new section.
    AddSection {
        /// Section to add.
        section: FormSection,
    },
    /// Replaces the section with the same id.
    UpdateSection {
        /// Replacement section.
        section: FormSection,
    },
    /// Removes a section; its items move to the default section.
    DeleteSection {
        /// Section id.
        section_id: String,
    },
    /// Adds a standalone field, or a widget field when `widgetId` is set.
    AddField {
        /// Field to add.
        field: FormField,
    },
    /// Replaces the field with the same id, moving it when `widgetId` changed.
    UpdateField {
        /// Replacement field.
        field: FormField,
    },
    /// Removes a field from wherever it lives.
    DeleteField {
        /// Field id.
        field_id: String,
    },
    /// Adds a widget.
    AddWidget {
        /// Widget to add.
        widget: FormWidget,
    },
    /// Adds a widget with a generated id and the template fields of its type.
    AddWidgetFromTemplate {
        /// Widget kind.
        widget_type: WidgetType,
        /// Target section id.
        section: String,
        /// Sort key within the section.
        order: i32,
    },
    /// Replaces the widget with the same id.
    UpdateWidget {
        /// Replacement widget.
        widget: FormWidget,
    },
    /// Removes a widget and its fields.
    DeleteWidget {
        /// Widget id.
        widget_id: String,
    },
    /// Replaces the step binding of a field or widget.
    SetBinding {
        /// Target item.
        item: FormItemRef,
        /// New binding.
        binding: StepBinding,
    },
}

impl FormConfigCommand {
    /// Returns stable command name.
    #[must_use]
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::AddSection { .. } => "add_section",
            Self::UpdateSection { .. } => "update_section",
            Self::DeleteSection { .. } => "delete_section",
            Self::AddField { .. } => "add_field",
            Self::UpdateField { .. } => "update_field",
            Self::DeleteField { .. } => "delete_field",
            Self::AddWidget { .. } => "add_widget",
            Self::AddWidgetFromTemplate { .. } => "add_widget_from_template",
            Self::UpdateWidget { .. } => "update_widget",
            Self::DeleteWidget { .. } => "delete_widget",
            Self::SetBinding { .. } => "set_binding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldLocation {
    Standalone(usize),
    InWidget(usize, usize),
}

impl FormConfiguration {
    /// Applies one edit and returns the resulting configuration.
    ///
    /// `self` is never modified; the result carries an incremented version and
    /// passes the same validation as a freshly constructed configuration.
    pub fn apply(&self, command: FormConfigCommand) -> AppResult<Self> {
        let mut input = self.to_input();

        match command {
            FormConfigCommand::AddSection { section } => {
                if input.sections.iter().any(|existing| existing.id() == section.id()) {
                    return Err(AppError::Conflict(format!(
                        "section '{}' already exists",
                        section.id()
                    )));
                }
                input.sections.push(section);
            }
            FormConfigCommand::UpdateSection { section } => {
                let index = input
                    .sections
                    .iter()
                    .position(|existing| existing.id() == section.id())
                    .ok_or_else(|| not_found("section", section.id()))?;
                input.sections[index] = section;
            }
            FormConfigCommand::DeleteSection { section_id } => {
                delete_section(&mut input, section_id.as_str())?;
            }
            FormConfigCommand::AddField { field } => {
                if locate_field(&input, field.id()).is_some() {
                    return Err(AppError::Conflict(format!(
                        "field '{}' already exists",
                        field.id()
                    )));
                }
                insert_field(&mut input, field)?;
            }
            FormConfigCommand::UpdateField { field } => {
                let location = locate_field(&input, field.id())
                    .ok_or_else(|| not_found("field", field.id()))?;
                let same_container = match location {
                    FieldLocation::Standalone(_) => field.widget_id().is_none(),
                    FieldLocation::InWidget(widget_index, _) => {
                        field.widget_id() == Some(input.widgets[widget_index].id())
                    }
                };

                if same_container {
                    replace_field(&mut input, location, field)?;
                } else {
                    remove_field(&mut input, location)?;
                    insert_field(&mut input, field)?;
                }
            }
            FormConfigCommand::DeleteField { field_id } => {
                let location = locate_field(&input, field_id.as_str())
                    .ok_or_else(|| not_found("field", field_id.as_str()))?;
                remove_field(&mut input, location)?;
            }
            FormConfigCommand::AddWidget { widget } => {
                add_widget(&mut input, widget)?;
            }
            FormConfigCommand::AddWidgetFromTemplate {
                widget_type,
                section,
                order,
            } => {
                let widget_id = format!("widget-{}", Uuid::new_v4());
                let widget = FormWidget::from_template(widget_id, widget_type, section, order)?;
                add_widget(&mut input, widget)?;
            }
            FormConfigCommand::UpdateWidget { widget } => {
                let index = widget_index(&input, widget.id())?;
                input.widgets[index] = widget;
            }
            FormConfigCommand::DeleteWidget { widget_id } => {
                let index = widget_index(&input, widget_id.as_str())?;
                input.widgets.remove(index);
            }
            FormConfigCommand::SetBinding { item, binding } => match item {
                FormItemRef::Field(field_id) => {
                    let location = locate_field(&input, field_id.as_str())
                        .ok_or_else(|| not_found("field", field_id.as_str()))?;
                    let mut field_input = field_at(&input, location).to_input();
                    field_input.workflow_step_binding = binding;
                    replace_field(&mut input, location, FormField::new(field_input)?)?;
                }
                FormItemRef::Widget(widget_id) => {
                    let index = widget_index(&input, widget_id.as_str())?;
                    let mut widget_input = input.widgets[index].to_input();
                    widget_input.workflow_step_binding = binding;
                    input.widgets[index] = FormWidget::new(widget_input)?;
                }
            },
        }

        input.version = self.version().saturating_add(1);
        Self::new(input)
    }
}

fn not_found(kind: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{kind} '{id}' does not exist"))
}

fn widget_index(input: &FormConfigurationInput, widget_id: &str) -> AppResult<usize> {
    input
        .widgets
        .iter()
        .position(|widget| widget.id() == widget_id)
        .ok_or_else(|| not_found("widget", widget_id))
}

fn locate_field(input: &FormConfigurationInput, field_id: &str) -> Option<FieldLocation> {
    if let Some(index) = input.fields.iter().position(|field| field.id() == field_id) {
        return Some(FieldLocation::Standalone(index));
    }

    input
        .widgets
        .iter()
        .enumerate()
        .find_map(|(widget_index, widget)| {
            widget
                .fields()
                .iter()
                .position(|field| field.id() == field_id)
                .map(|field_index| FieldLocation::InWidget(widget_index, field_index))
        })
}

fn field_at(input: &FormConfigurationInput, location: FieldLocation) -> &FormField {
    match location {
        FieldLocation::Standalone(index) => &input.fields[index],
        FieldLocation::InWidget(widget_index, field_index) => {
            &input.widgets[widget_index].fields()[field_index]
        }
    }
}

fn insert_field(input: &mut FormConfigurationInput, field: FormField) -> AppResult<()> {
    let Some(widget_id) = field.widget_id() else {
        input.fields.push(field);
        return Ok(());
    };

    let index = input
        .widgets
        .iter()
        .position(|widget| widget.id() == widget_id)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "field '{}' references unknown widget '{widget_id}'",
                field.id()
            ))
        })?;

    let mut widget_input = input.widgets[index].to_input();
    widget_input.fields.push(field);
    input.widgets[index] = FormWidget::new(widget_input)?;
    Ok(())
}

fn replace_field(
    input: &mut FormConfigurationInput,
    location: FieldLocation,
    field: FormField,
) -> AppResult<()> {
    match location {
        FieldLocation::Standalone(index) => input.fields[index] = field,
        FieldLocation::InWidget(widget_index, field_index) => {
            let mut widget_input = input.widgets[widget_index].to_input();
            widget_input.fields[field_index] = field;
            input.widgets[widget_index] = FormWidget::new(widget_input)?;
        }
    }

    Ok(())
}

fn remove_field(input: &mut FormConfigurationInput, location: FieldLocation) -> AppResult<()> {
    match location {
        FieldLocation::Standalone(index) => {
            input.fields.remove(index);
        }
        FieldLocation::InWidget(widget_index, field_index) => {
            let mut widget_input = input.widgets[widget_index].to_input();
            widget_input.fields.remove(field_index);
            input.widgets[widget_index] = FormWidget::new(widget_input)?;
        }
    }

    Ok(())
}

fn add_widget(input: &mut FormConfigurationInput, widget: FormWidget) -> AppResult<()> {
    if input.widgets.iter().any(|existing| existing.id() == widget.id()) {
        return Err(AppError::Conflict(format!(
            "widget '{}' already exists",
            widget.id()
        )));
    }

    input.widgets.push(widget);
    Ok(())
}

fn delete_section(input: &mut FormConfigurationInput, section_id: &str) -> AppResult<()> {
    let index = input
        .sections
        .iter()
        .position(|section| section.id() == section_id)
        .ok_or_else(|| not_found("section", section_id))?;
    input.sections.remove(index);

    for field in &mut input.fields {
        if field.section() == section_id {
            *field = with_default_section(field)?;
        }
    }

    for widget in &mut input.widgets {
        let moves_widget = widget.section() == section_id;
        let moves_fields = widget.fields().iter().any(|field| field.section() == section_id);
        if !moves_widget && !moves_fields {
            continue;
        }

        let mut widget_input = widget.to_input();
        if moves_widget {
            widget_input.section = DEFAULT_SECTION_ID.to_owned();
        }
        widget_input.fields = widget_input
            .fields
            .iter()
            .map(|field| {
                if field.section() == section_id {
                    with_default_section(field)
                } else {
                    Ok(field.clone())
                }
            })
            .collect::<AppResult<Vec<_>>>()?;
        *widget = FormWidget::new(widget_input)?;
    }

    Ok(())
}

fn with_default_section(field: &FormField) -> AppResult<FormField> {
    let mut field_input = field.to_input();
    field_input.section = DEFAULT_SECTION_ID.to_owned();
    FormField::new(field_input)
}

#[cfg(test)]
mod tests {
    use stepform_core::AppError;

    use crate::binding::StepBinding;
    use crate::form::{
        FormConfiguration, FormConfigurationInput, FormItemRef, FormSection, FormSectionInput,
    };
    use crate::form_field::{DEFAULT_SECTION_ID, FieldType, FormField, FormFieldInput};
    use crate::form_widget::{FormWidget, FormWidgetInput, WidgetType};

    use super::FormConfigCommand;

    fn field(id: &str, section: &str, widget_id: Option<&str>) -> FormField {
        let mut input = FormFieldInput::new(id, FieldType::Text, id, id);
        input.section = section.to_owned();
        input.widget_id = widget_id.map(str::to_owned);
        FormField::new(input).unwrap_or_else(|_| unreachable!())
    }

    fn base() -> FormConfiguration {
        let section = FormSection::new(FormSectionInput {
            id: "general".to_owned(),
            title: "General".to_owned(),
            order: 1,
            permissions: None,
        })
        .unwrap_or_else(|_| unreachable!());
        let mut widget = FormWidgetInput::new("w-1", WidgetType::Custom, "Group");
        widget.section = "general".to_owned();
        widget.fields = vec![field("inner", "general", Some("w-1"))];

        FormConfiguration::new(FormConfigurationInput {
            id: "form".to_owned(),
            name: "Form".to_owned(),
            version: 1,
            sections: vec![section],
            fields: vec![field("title", "general", None)],
            widgets: vec![FormWidget::new(widget).unwrap_or_else(|_| unreachable!())],
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn apply_returns_new_value_and_keeps_original() {
        let original = base();
        let updated = original.apply(FormConfigCommand::AddField {
            field: field("budget", DEFAULT_SECTION_ID, None),
        });
        assert!(updated.is_ok());
        let updated = updated.unwrap_or_else(|_| unreachable!());

        assert_eq!(original.fields().len(), 1);
        assert_eq!(updated.fields().len(), 2);
        assert_eq!(updated.version(), original.version() + 1);
    }

    #[test]
    fn add_field_with_widget_id_lands_in_widget() {
        let updated = base()
            .apply(FormConfigCommand::AddField {
                field: field("inner-2", "general", Some("w-1")),
            })
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.fields().len(), 1);
        assert_eq!(updated.widgets()[0].fields().len(), 2);
    }

    #[test]
    fn add_field_with_unknown_widget_is_rejected() {
        let result = base().apply(FormConfigCommand::AddField {
            field: field("orphan", "general", Some("ghost")),
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn duplicate_field_is_a_conflict() {
        let result = base().apply(FormConfigCommand::AddField {
            field: field("inner", "general", None),
        });
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn update_field_moves_between_containers() {
        let updated = base()
            .apply(FormConfigCommand::UpdateField {
                field: field("title", "general", Some("w-1")),
            })
            .unwrap_or_else(|_| unreachable!());
        assert!(updated.fields().is_empty());
        assert_eq!(updated.widgets()[0].fields().len(), 2);
    }

    #[test]
    fn delete_unknown_field_is_not_found() {
        let result = base().apply(FormConfigCommand::DeleteField {
            field_id: "missing".to_owned(),
        });
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn delete_section_moves_items_to_default() {
        let updated = base()
            .apply(FormConfigCommand::DeleteSection {
                section_id: "general".to_owned(),
            })
            .unwrap_or_else(|_| unreachable!());
        assert!(updated.sections().is_empty());
        assert_eq!(updated.fields()[0].section(), DEFAULT_SECTION_ID);
        assert_eq!(updated.widgets()[0].section(), DEFAULT_SECTION_ID);
        assert_eq!(updated.widgets()[0].fields()[0].section(), DEFAULT_SECTION_ID);
    }

    #[test]
    fn set_binding_updates_widget_field() {
        let updated = base()
            .apply(FormConfigCommand::SetBinding {
                item: FormItemRef::Field("inner".to_owned()),
                binding: StepBinding::new(["s2"]),
            })
            .unwrap_or_else(|_| unreachable!());
        let inner = updated.find_field("inner");
        assert!(inner.is_some_and(|field| field.workflow_step_binding().contains("s2")));
    }

    #[test]
    fn template_widget_gets_generated_id() {
        let updated = base()
            .apply(FormConfigCommand::AddWidgetFromTemplate {
                widget_type: WidgetType::BudgetGroup,
                section: "general".to_owned(),
                order: 5,
            })
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.widgets().len(), 2);
        let created = &updated.widgets()[1];
        assert!(created.id().starts_with("widget-"));
        assert_eq!(created.fields().len(), 2);
    }

    #[test]
    fn delete_widget_removes_its_fields() {
        let updated = base()
            .apply(FormConfigCommand::DeleteWidget {
                widget_id: "w-1".to_owned(),
            })
            .unwrap_or_else(|_| unreachable!());
        assert!(updated.find_field("inner").is_none());
    }

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let parsed: Result<FormConfigCommand, _> = serde_json::from_value(serde_json::json!({
            "command": "set_binding",
            "item": {"kind": "widget", "id": "w-1"},
            "binding": ["s1", "s2"]
        }));
        assert!(parsed.is_ok());
        let command = parsed.unwrap_or_else(|_| unreachable!());
        assert_eq!(command.command_name(), "set_binding");
    }
}
