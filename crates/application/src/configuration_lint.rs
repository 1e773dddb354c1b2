use std::collections::BTreeMap;

use serde::Serialize;
use stepform_domain::{
    FormConfiguration, FormItemRef, LEGACY_FIRST_STEP_ID, StepBinding, WorkflowDefinition,
};

/// Authoring problem that does not prevent resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "lint", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ConfigurationLint {
    /// A binding names a step id the workflow does not have.
    DanglingBinding {
        /// Field or widget carrying the binding.
        item: FormItemRef,
        /// Unknown step id.
        step_id: String,
    },
    /// Top-level items of one section share an order value.
    ConflictingOrder {
        /// Section id.
        section_id: String,
        /// Shared order value.
        order: i32,
        /// Items sharing it, in authoring order.
        items: Vec<FormItemRef>,
    },
    /// Fields of one widget share an order value.
    ConflictingWidgetFieldOrder {
        /// Widget id.
        widget_id: String,
        /// Shared order value.
        order: i32,
        /// Field ids sharing it, in authoring order.
        field_ids: Vec<String>,
    },
}

/// Lists dangling bindings and conflicting orders of a configuration.
///
/// Orders are compared among the top-level items of each section and among
/// the fields of each widget.
///
/// The legacy `"step-1"` placeholder is not dangling while the workflow has a
/// first step.
#[must_use]
pub fn lint_configuration(
    workflow: &WorkflowDefinition,
    config: &FormConfiguration,
) -> Vec<ConfigurationLint> {
    let mut lints = Vec::new();
    let has_first_step = workflow.first_steps().next().is_some();

    let mut check_binding = |item: FormItemRef, binding: &StepBinding| {
        for step_id in binding.step_ids() {
            let known = workflow.find_step(step_id).is_some()
                || (has_first_step && step_id == LEGACY_FIRST_STEP_ID);
            if !known {
                lints.push(ConfigurationLint::DanglingBinding {
                    item: item.clone(),
                    step_id: step_id.clone(),
                });
            }
        }
    };

    for field in config.fields() {
        check_binding(FormItemRef::Field(field.id().to_owned()), field.workflow_step_binding());
    }
    for widget in config.widgets() {
        check_binding(FormItemRef::Widget(widget.id().to_owned()), widget.workflow_step_binding());
        for field in widget.fields() {
            check_binding(FormItemRef::Field(field.id().to_owned()), field.workflow_step_binding());
        }
    }

    let mut by_position: BTreeMap<(&str, i32), Vec<FormItemRef>> = BTreeMap::new();
    for item in config.items() {
        by_position
            .entry((item.section(), item.order()))
            .or_default()
            .push(item.to_ref());
    }
    for ((section_id, order), items) in by_position {
        if items.len() > 1 {
            lints.push(ConfigurationLint::ConflictingOrder {
                section_id: section_id.to_owned(),
                order,
                items,
            });
        }
    }

    for widget in config.widgets() {
        let mut by_order: BTreeMap<i32, Vec<String>> = BTreeMap::new();
        for field in widget.fields() {
            by_order
                .entry(field.order())
                .or_default()
                .push(field.id().to_owned());
        }
        for (order, field_ids) in by_order {
            if field_ids.len() > 1 {
                lints.push(ConfigurationLint::ConflictingWidgetFieldOrder {
                    widget_id: widget.id().to_owned(),
                    order,
                    field_ids,
                });
            }
        }
    }

    lints
}
