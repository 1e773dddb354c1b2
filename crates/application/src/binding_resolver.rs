use serde::Serialize;
use stepform_domain::{
    DEFAULT_SECTION_ID, FormConfiguration, FormField, FormItem, FormSection, FormWidget,
    LEGACY_FIRST_STEP_ID, StepBinding, WorkflowDefinition,
};

/// The step a form is being resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext<'a> {
    step_id: &'a str,
    is_first_step: bool,
}

impl<'a> StepContext<'a> {
    /// Creates a context from an explicit first-step flag.
    #[must_use]
    pub fn new(step_id: &'a str, is_first_step: bool) -> Self {
        Self {
            step_id,
            is_first_step,
        }
    }

    /// Creates a context, deriving the first-step flag from the workflow.
    ///
    /// A step id unknown to the workflow is never the first step.
    #[must_use]
    pub fn for_workflow(workflow: &WorkflowDefinition, step_id: &'a str) -> Self {
        Self::new(step_id, workflow.is_first_step(step_id))
    }

    /// Returns the step id.
    #[must_use]
    pub fn step_id(&self) -> &'a str {
        self.step_id
    }

    /// Returns whether the step is the first of its workflow.
    #[must_use]
    pub fn is_first_step(&self) -> bool {
        self.is_first_step
    }

    /// Returns whether an item with this binding is in scope for the step.
    #[must_use]
    pub fn includes(&self, binding: &StepBinding) -> bool {
        binding.is_unbound()
            || binding.contains(self.step_id)
            || (self.is_first_step && binding.contains(LEGACY_FIRST_STEP_ID))
    }
}

/// Returns whether a field is in scope for the step, judged on its own binding.
///
/// Used outside a widget context; a field inside an in-scope widget is always
/// rendered with it.
#[must_use]
pub fn field_in_scope(field: &FormField, context: StepContext<'_>) -> bool {
    context.includes(field.workflow_step_binding())
}

/// Returns whether a widget is in scope for the step.
#[must_use]
pub fn widget_in_scope(widget: &FormWidget, context: StepContext<'_>) -> bool {
    context.includes(widget.workflow_step_binding())
}

/// One top-level item selected for a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum ResolvedItem {
    /// Field outside any widget.
    StandaloneField(FormField),
    /// Widget with every contained field, sorted by field order.
    Widget(FormWidget),
}

impl ResolvedItem {
    /// Returns item id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::StandaloneField(field) => field.id(),
            Self::Widget(widget) => widget.id(),
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
}

/// Items of one section selected for a step, sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSection {
    /// Section id the items reference.
    pub section_id: String,
    /// Declared section, absent for `"default"` or undeclared ids.
    pub section: Option<FormSection>,
    /// Items, never empty after resolution.
    pub items: Vec<ResolvedItem>,
}

/// Fields and widgets in scope for one workflow step, grouped by section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStep {
    step_id: String,
    sections: Vec<ResolvedSection>,
}

impl ResolvedStep {
    /// Creates a resolved step from already ordered sections.
    #[must_use]
    pub fn new(step_id: impl Into<String>, sections: Vec<ResolvedSection>) -> Self {
        Self {
            step_id: step_id.into(),
            sections,
        }
    }

    /// Returns the resolved step id.
    #[must_use]
    pub fn step_id(&self) -> &str {
        self.step_id.as_str()
    }

    /// Returns sections in display order.
    #[must_use]
    pub fn sections(&self) -> &[ResolvedSection] {
        &self.sections
    }

    /// Consumes the step and returns its sections.
    #[must_use]
    pub fn into_sections(self) -> Vec<ResolvedSection> {
        self.sections
    }

    /// Returns in-scope standalone fields in display order.
    #[must_use]
    pub fn fields(&self) -> Vec<&FormField> {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter())
            .filter_map(|item| match item {
                ResolvedItem::StandaloneField(field) => Some(field),
                ResolvedItem::Widget(_) => None,
            })
            .collect()
    }

    /// Returns in-scope widgets in display order.
    #[must_use]
    pub fn widgets(&self) -> Vec<&FormWidget> {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter())
            .filter_map(|item| match item {
                ResolvedItem::Widget(widget) => Some(widget),
                ResolvedItem::StandaloneField(_) => None,
            })
            .collect()
    }

    /// Returns whether nothing is in scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Selects the fields and widgets in scope for a step.
///
/// An item is in scope when its binding is empty, lists `step_id`, or, for the
/// first step only, lists the legacy `"step-1"` placeholder. Unknown step ids
/// and empty configurations are not errors; they just match fewer items.
#[must_use]
pub fn resolve_step(config: &FormConfiguration, step_id: &str, is_first_step: bool) -> ResolvedStep {
    resolve_with_context(config, StepContext::new(step_id, is_first_step))
}

/// Same as [`resolve_step`] with a prepared context.
#[must_use]
pub fn resolve_with_context(config: &FormConfiguration, context: StepContext<'_>) -> ResolvedStep {
    let in_scope: Vec<FormItem<'_>> = config
        .items()
        .filter(|item| context.includes(item.workflow_step_binding()))
        .collect();

    let sections = ordered_section_ids(config, &in_scope)
        .into_iter()
        .filter_map(|section_id| {
            let mut items: Vec<FormItem<'_>> = in_scope
                .iter()
                .copied()
                .filter(|item| item.section() == section_id)
                .collect();
            if items.is_empty() {
                return None;
            }
            items.sort_by_key(FormItem::order);

            Some(ResolvedSection {
                section_id: section_id.to_owned(),
                section: config.find_section(section_id).cloned(),
                items: items.into_iter().map(to_resolved_item).collect(),
            })
        })
        .collect();

    ResolvedStep::new(context.step_id(), sections)
}

fn to_resolved_item(item: FormItem<'_>) -> ResolvedItem {
    match item {
        FormItem::StandaloneField(field) => ResolvedItem::StandaloneField(field.clone()),
        FormItem::Widget(widget) => ResolvedItem::Widget(widget.with_sorted_fields()),
    }
}

/// Undeclared `"default"` first, declared sections by order, then other
/// undeclared ids in order of first appearance.
fn ordered_section_ids<'a>(config: &'a FormConfiguration, items: &[FormItem<'a>]) -> Vec<&'a str> {
    let mut ordered: Vec<&'a str> = Vec::new();
    if config.find_section(DEFAULT_SECTION_ID).is_none() {
        ordered.push(DEFAULT_SECTION_ID);
    }

    let mut declared: Vec<&'a FormSection> = config.sections().iter().collect();
    declared.sort_by_key(|section| section.order());
    ordered.extend(declared.into_iter().map(FormSection::id));

    for item in items {
        if !ordered.contains(&item.section()) {
            ordered.push(item.section());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use stepform_domain::{
        FieldType, FormConfiguration, FormConfigurationInput, FormField, FormFieldInput,
        FormSection, FormSectionInput, FormWidget, FormWidgetInput, StepBinding, WidgetType,
    };

    use super::{ResolvedItem, StepContext, field_in_scope, resolve_step};

    fn field(id: &str, section: &str, order: i32, binding: &[&str]) -> FormField {
        let mut input = FormFieldInput::new(id, FieldType::Text, id, id);
        input.section = section.to_owned();
        input.order = order;
        input.workflow_step_binding = StepBinding::new(binding.iter().copied());
        FormField::new(input).unwrap_or_else(|_| unreachable!())
    }

    fn widget_field(id: &str, widget_id: &str, order: i32, binding: &[&str]) -> FormField {
        let mut input = FormFieldInput::new(id, FieldType::Text, id, id);
        input.widget_id = Some(widget_id.to_owned());
        input.order = order;
        input.workflow_step_binding = StepBinding::new(binding.iter().copied());
        FormField::new(input).unwrap_or_else(|_| unreachable!())
    }

    fn widget(id: &str, section: &str, order: i32, binding: &[&str], fields: Vec<FormField>) -> FormWidget {
        let mut input = FormWidgetInput::new(id, WidgetType::Custom, id);
        input.section = section.to_owned();
        input.order = order;
        input.workflow_step_binding = StepBinding::new(binding.iter().copied());
        input.fields = fields;
        FormWidget::new(input).unwrap_or_else(|_| unreachable!())
    }

    fn section(id: &str, order: i32) -> FormSection {
        FormSection::new(FormSectionInput {
            id: id.to_owned(),
            title: id.to_owned(),
            order,
            permissions: None,
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn configuration(
        sections: Vec<FormSection>,
        fields: Vec<FormField>,
        widgets: Vec<FormWidget>,
    ) -> FormConfiguration {
        FormConfiguration::new(FormConfigurationInput {
            id: "form".to_owned(),
            name: "Form".to_owned(),
            version: 1,
            sections,
            fields,
            widgets,
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn field_ids(config: &FormConfiguration, step_id: &str, is_first_step: bool) -> Vec<String> {
        resolve_step(config, step_id, is_first_step)
            .fields()
            .iter()
            .map(|field| field.id().to_owned())
            .collect()
    }

    #[test]
    fn unbound_items_show_on_every_step() {
        let config = configuration(
            Vec::new(),
            vec![field("always", "default", 1, &[])],
            vec![widget("w", "default", 2, &[], Vec::new())],
        );

        for step_id in ["s1", "s2", "not-in-workflow"] {
            let resolved = resolve_step(&config, step_id, false);
            assert_eq!(resolved.fields().len(), 1);
            assert_eq!(resolved.widgets().len(), 1);
        }
    }

    #[test]
    fn bound_items_match_exact_step_ids() {
        let config = configuration(
            Vec::new(),
            vec![field("only-s2", "default", 1, &["s2"])],
            Vec::new(),
        );

        assert_eq!(field_ids(&config, "s2", false), vec!["only-s2"]);
        assert!(field_ids(&config, "s3", false).is_empty());
    }

    #[test]
    fn legacy_placeholder_resolves_against_first_step_only() {
        let config = configuration(
            Vec::new(),
            vec![field("legacy", "default", 1, &["step-1"])],
            Vec::new(),
        );

        assert_eq!(field_ids(&config, "wf-abc-001", true), vec!["legacy"]);
        assert!(field_ids(&config, "wf-abc-002", false).is_empty());
    }

    #[test]
    fn legacy_placeholder_still_matches_literally() {
        let config = configuration(
            Vec::new(),
            vec![field("legacy", "default", 1, &["step-1"])],
            Vec::new(),
        );

        assert_eq!(field_ids(&config, "step-1", false), vec!["legacy"]);
    }

    #[test]
    fn widget_fields_follow_the_widget_binding() {
        let config = configuration(
            Vec::new(),
            Vec::new(),
            vec![widget(
                "w",
                "default",
                1,
                &["step-2"],
                vec![widget_field("inner", "w", 1, &["step-5"])],
            )],
        );

        let resolved = resolve_step(&config, "step-2", false);
        let widgets = resolved.widgets();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].fields().len(), 1);
        assert_eq!(widgets[0].fields()[0].id(), "inner");

        assert!(!field_in_scope(
            &widgets[0].fields()[0],
            StepContext::new("step-2", false)
        ));
        assert!(resolve_step(&config, "step-5", false).is_empty());
    }

    #[test]
    fn widget_gate_wins_over_field_binding() {
        let config = configuration(
            Vec::new(),
            Vec::new(),
            vec![widget(
                "w",
                "default",
                1,
                &["s1"],
                vec![widget_field("inner", "w", 1, &["s2"])],
            )],
        );

        assert!(resolve_step(&config, "s2", false).widgets().is_empty());
    }

    #[test]
    fn items_are_grouped_by_section_and_sorted_stably() {
        let config = configuration(
            vec![section("later", 2), section("earlier", 1)],
            vec![
                field("b", "earlier", 2, &[]),
                field("tie-1", "earlier", 1, &[]),
                field("tie-2", "earlier", 1, &[]),
                field("late", "later", 1, &[]),
                field("loose", "default", 5, &[]),
                field("orphan", "undeclared", 1, &[]),
            ],
            vec![widget("w", "earlier", 1, &[], Vec::new())],
        );

        let resolved = resolve_step(&config, "any", false);
        let layout: Vec<(String, Vec<String>)> = resolved
            .sections()
            .iter()
            .map(|section| {
                (
                    section.section_id.clone(),
                    section
                        .items
                        .iter()
                        .map(|item| item.id().to_owned())
                        .collect(),
                )
            })
            .collect();

        assert_eq!(
            layout,
            vec![
                ("default".to_owned(), vec!["loose".to_owned()]),
                (
                    "earlier".to_owned(),
                    vec![
                        "tie-1".to_owned(),
                        "tie-2".to_owned(),
                        "w".to_owned(),
                        "b".to_owned()
                    ]
                ),
                ("later".to_owned(), vec!["late".to_owned()]),
                ("undeclared".to_owned(), vec!["orphan".to_owned()]),
            ]
        );
        assert!(resolved.sections()[1].section.is_some());
        assert!(resolved.sections()[3].section.is_none());
    }

    #[test]
    fn widget_fields_are_sorted_by_order() {
        let config = configuration(
            Vec::new(),
            Vec::new(),
            vec![widget(
                "w",
                "default",
                1,
                &[],
                vec![
                    widget_field("second", "w", 2, &[]),
                    widget_field("first", "w", 1, &[]),
                ],
            )],
        );

        let resolved = resolve_step(&config, "s1", false);
        let ResolvedItem::Widget(widget) = &resolved.sections()[0].items[0] else {
            unreachable!()
        };
        let ids: Vec<&str> = widget.fields().iter().map(FormField::id).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn empty_configuration_resolves_to_nothing() {
        assert!(resolve_step(&FormConfiguration::empty(), "s1", true).is_empty());
    }
}
