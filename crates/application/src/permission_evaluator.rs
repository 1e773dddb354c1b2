use stepform_domain::{AccessLevel, FieldPermissions, FormField, FormWidget, ViewerRoles};

use crate::binding_resolver::{ResolvedItem, ResolvedStep};
use crate::step_view::{FieldView, ItemView, SectionView, StepFormView, WidgetView};

/// Computes the access a viewer has to an item with the given rules.
///
/// First match wins:
/// 1. no rules: editable;
/// 2. viewer holds any `hide_from_roles` role: hidden;
/// 3. allow-list non-empty and viewer holds none of it: hidden;
/// 4. viewer holds any `read_only_roles` role: read-only;
/// 5. otherwise editable.
#[must_use]
pub fn evaluate_permission(
    permissions: Option<&FieldPermissions>,
    viewer: &ViewerRoles,
) -> AccessLevel {
    let Some(permissions) = permissions else {
        return AccessLevel::Editable;
    };

    if viewer.holds_any(&permissions.hide_from_roles) {
        return AccessLevel::Hidden;
    }

    let is_allowed =
        permissions.allowed_roles.is_empty() || viewer.holds_any(&permissions.allowed_roles);
    if !is_allowed {
        return AccessLevel::Hidden;
    }

    if viewer.holds_any(&permissions.read_only_roles) {
        return AccessLevel::ReadOnly;
    }

    AccessLevel::Editable
}

/// Annotates every resolved item with the viewer's effective access.
///
/// Section rules gate all items of the section and widget rules gate the
/// widget's fields; the most restrictive verdict wins.
#[must_use]
pub fn annotate_step(resolved: &ResolvedStep, viewer: &ViewerRoles) -> StepFormView {
    let sections = resolved
        .sections()
        .iter()
        .map(|section| {
            let section_access = evaluate_permission(
                section
                    .section
                    .as_ref()
                    .and_then(|declared| declared.permissions()),
                viewer,
            );

            SectionView {
                section_id: section.section_id.clone(),
                title: section
                    .section
                    .as_ref()
                    .map(|declared| declared.title().to_owned()),
                access: section_access,
                items: section
                    .items
                    .iter()
                    .map(|item| match item {
                        ResolvedItem::StandaloneField(field) => {
                            ItemView::Field(field_view(field, section_access, viewer))
                        }
                        ResolvedItem::Widget(widget) => {
                            ItemView::Widget(widget_view(widget, section_access, viewer))
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    StepFormView {
        step_id: resolved.step_id().to_owned(),
        sections,
    }
}

fn field_view(field: &FormField, gate: AccessLevel, viewer: &ViewerRoles) -> FieldView {
    FieldView {
        field: field.clone(),
        access: gate.combine(evaluate_permission(field.permissions(), viewer)),
    }
}

fn widget_view(widget: &FormWidget, gate: AccessLevel, viewer: &ViewerRoles) -> WidgetView {
    let access = gate.combine(evaluate_permission(widget.permissions(), viewer));

    WidgetView {
        widget_id: widget.id().to_owned(),
        widget_type: widget.widget_type(),
        title: widget.title().to_owned(),
        description: widget.description().map(str::to_owned),
        order: widget.order(),
        collapsible: widget.collapsible(),
        collapsed: widget.collapsed(),
        access,
        fields: widget
            .sorted_fields()
            .into_iter()
            .map(|field| field_view(field, access, viewer))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use stepform_domain::{
        AccessLevel, FieldPermissions, FieldType, FormConfiguration, FormConfigurationInput,
        FormField, FormFieldInput, FormSection, FormSectionInput, FormWidget, FormWidgetInput,
        Role, ViewerRoles, WidgetType,
    };

    use super::{annotate_step, evaluate_permission};
    use crate::binding_resolver::resolve_step;

    fn roles(names: &[&str]) -> BTreeSet<Role> {
        names
            .iter()
            .map(|name| Role::new(*name).unwrap_or_else(|_| unreachable!()))
            .collect()
    }

    fn viewer(names: &[&str]) -> ViewerRoles {
        ViewerRoles::new(roles(names)).unwrap_or_else(|_| unreachable!())
    }

    fn permissions(allowed: &[&str], read_only: &[&str], hidden: &[&str]) -> FieldPermissions {
        FieldPermissions {
            allowed_roles: roles(allowed),
            read_only_roles: roles(read_only),
            hide_from_roles: roles(hidden),
        }
    }

    #[test]
    fn missing_permissions_are_editable() {
        assert_eq!(
            evaluate_permission(None, &viewer(&["Anyone"])),
            AccessLevel::Editable
        );
    }

    #[test]
    fn hide_beats_allow() {
        let rules = permissions(&["Approver"], &[], &["Approver"]);
        assert_eq!(
            evaluate_permission(Some(&rules), &viewer(&["Approver"])),
            AccessLevel::Hidden
        );
    }

    #[test]
    fn empty_lists_allow_everyone() {
        let rules = permissions(&[], &[], &[]);
        for names in [&["Approver"][..], &["Guest", "Requester"][..]] {
            assert_eq!(
                evaluate_permission(Some(&rules), &viewer(names)),
                AccessLevel::Editable
            );
        }
    }

    #[test]
    fn viewer_outside_allow_list_is_hidden() {
        let rules = permissions(&["Approver"], &[], &[]);
        assert_eq!(
            evaluate_permission(Some(&rules), &viewer(&["Requester"])),
            AccessLevel::Hidden
        );
        assert_eq!(
            evaluate_permission(Some(&rules), &viewer(&["Requester", "Approver"])),
            AccessLevel::Editable
        );
    }

    #[test]
    fn read_only_applies_to_allowed_viewers() {
        let rules = permissions(&[], &["Auditor"], &[]);
        assert_eq!(
            evaluate_permission(Some(&rules), &viewer(&["Auditor"])),
            AccessLevel::ReadOnly
        );

        let rules = permissions(&["Approver"], &["Auditor"], &[]);
        assert_eq!(
            evaluate_permission(Some(&rules), &viewer(&["Auditor"])),
            AccessLevel::Hidden
        );
    }

    #[test]
    fn section_and_widget_rules_gate_their_items() {
        let section = FormSection::new(FormSectionInput {
            id: "finance".to_owned(),
            title: "Finance".to_owned(),
            order: 1,
            permissions: Some(permissions(&[], &["Requester"], &[])),
        })
        .unwrap_or_else(|_| unreachable!());

        let mut standalone = FormFieldInput::new("budget", FieldType::Currency, "budget", "Budget");
        standalone.section = "finance".to_owned();

        let mut inner = FormFieldInput::new("comment", FieldType::Textarea, "comment", "Comment");
        inner.widget_id = Some("approval".to_owned());
        inner.section = "finance".to_owned();

        let mut widget = FormWidgetInput::new("approval", WidgetType::ApprovalGroup, "Approval");
        widget.section = "finance".to_owned();
        widget.permissions = Some(permissions(&[], &[], &["Guest"]));
        widget.fields = vec![FormField::new(inner).unwrap_or_else(|_| unreachable!())];

        let config = FormConfiguration::new(FormConfigurationInput {
            id: "form".to_owned(),
            name: "Form".to_owned(),
            version: 1,
            sections: vec![section],
            fields: vec![FormField::new(standalone).unwrap_or_else(|_| unreachable!())],
            widgets: vec![FormWidget::new(widget).unwrap_or_else(|_| unreachable!())],
        })
        .unwrap_or_else(|_| unreachable!());
        let resolved = resolve_step(&config, "s1", true);

        let requester = annotate_step(&resolved, &viewer(&["Requester"]));
        assert_eq!(requester.field_access("budget"), Some(AccessLevel::ReadOnly));
        assert_eq!(requester.field_access("comment"), Some(AccessLevel::ReadOnly));

        let guest = annotate_step(&resolved, &viewer(&["Guest"]));
        assert_eq!(guest.field_access("budget"), Some(AccessLevel::Editable));
        assert_eq!(guest.field_access("comment"), Some(AccessLevel::Hidden));

        let visible = guest.without_hidden();
        assert_eq!(visible.sections.len(), 1);
        assert_eq!(visible.sections[0].items.len(), 1);
        assert_eq!(visible.field_access("comment"), None);
    }

    #[test]
    fn hidden_section_hides_every_item_and_is_dropped() {
        let hidden_section = FormSection::new(FormSectionInput {
            id: "internal".to_owned(),
            title: "Internal".to_owned(),
            order: 2,
            permissions: Some(permissions(&[], &[], &["Supplier"])),
        })
        .unwrap_or_else(|_| unreachable!());

        let mut standalone = FormFieldInput::new("margin", FieldType::Number, "margin", "Margin");
        standalone.section = "internal".to_owned();

        let mut inner = FormFieldInput::new("decision", FieldType::Textarea, "decision", "Decision");
        inner.widget_id = Some("review".to_owned());
        inner.section = "internal".to_owned();

        let mut widget = FormWidgetInput::new("review", WidgetType::Custom, "Review");
        widget.section = "internal".to_owned();
        widget.fields = vec![FormField::new(inner).unwrap_or_else(|_| unreachable!())];

        let config = FormConfiguration::new(FormConfigurationInput {
            id: "form".to_owned(),
            name: "Form".to_owned(),
            version: 1,
            sections: vec![hidden_section],
            fields: vec![
                FormField::new(standalone).unwrap_or_else(|_| unreachable!()),
                FormField::new(FormFieldInput::new("title", FieldType::Text, "title", "Title"))
                    .unwrap_or_else(|_| unreachable!()),
            ],
            widgets: vec![FormWidget::new(widget).unwrap_or_else(|_| unreachable!())],
        })
        .unwrap_or_else(|_| unreachable!());

        let supplier = annotate_step(&resolve_step(&config, "s1", false), &viewer(&["Supplier"]));
        let internal = supplier
            .sections
            .iter()
            .find(|section| section.section_id == "internal")
            .unwrap_or_else(|| unreachable!());
        assert_eq!(internal.access, AccessLevel::Hidden);
        assert!(
            internal
                .items
                .iter()
                .all(|item| item.access() == AccessLevel::Hidden)
        );
        assert_eq!(supplier.field_access("margin"), Some(AccessLevel::Hidden));
        assert_eq!(supplier.field_access("decision"), Some(AccessLevel::Hidden));
        assert_eq!(supplier.field_access("title"), Some(AccessLevel::Editable));

        let visible = supplier.without_hidden();
        let section_ids: Vec<&str> = visible
            .sections
            .iter()
            .map(|section| section.section_id.as_str())
            .collect();
        assert_eq!(section_ids, vec!["default"]);
    }

    #[test]
    fn stored_hide_rule_applies_to_padded_role_names() {
        let parsed: Result<FieldPermissions, _> =
            serde_json::from_value(serde_json::json!({"hideFromRoles": [" Guest"]}));
        let rules = parsed.unwrap_or_default();
        let guest = ViewerRoles::parse_list(" Guest").unwrap_or_else(|_| unreachable!());

        assert_eq!(evaluate_permission(Some(&rules), &guest), AccessLevel::Hidden);
    }
}
