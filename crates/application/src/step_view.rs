use serde::Serialize;
use stepform_domain::{AccessLevel, FormField, WidgetType};

/// A field together with its effective access for the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    /// Field definition.
    pub field: FormField,
    /// Effective access after section, widget and field rules.
    pub access: AccessLevel,
}

/// A widget together with its effective access and annotated fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView {
    /// Widget id.
    pub widget_id: String,
    /// Widget kind.
    pub widget_type: WidgetType,
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Sort key within the section.
    pub order: i32,
    /// Whether the widget can be collapsed.
    pub collapsible: bool,
    /// Whether the widget starts collapsed.
    pub collapsed: bool,
    /// Effective access after section and widget rules.
    pub access: AccessLevel,
    /// Contained fields sorted by order.
    pub fields: Vec<FieldView>,
}

/// One annotated top-level item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemView {
    /// Standalone field.
    Field(FieldView),
    /// Widget.
    Widget(WidgetView),
}

impl ItemView {
    /// Returns the effective access of the item itself.
    #[must_use]
    pub fn access(&self) -> AccessLevel {
        match self {
            Self::Field(view) => view.access,
            Self::Widget(view) => view.access,
        }
    }

    /// Returns item id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Field(view) => view.field.id(),
            Self::Widget(view) => view.widget_id.as_str(),
        }
    }
}

/// Annotated items of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    /// Section id.
    pub section_id: String,
    /// Declared title, absent for undeclared sections.
    pub title: Option<String>,
    /// Verdict of the section's own rules.
    pub access: AccessLevel,
    /// Items in display order.
    pub items: Vec<ItemView>,
}

/// The form of one step as one viewer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFormView {
    /// Step id the view was built for.
    pub step_id: String,
    /// Sections in display order.
    pub sections: Vec<SectionView>,
}

impl StepFormView {
    /// Drops hidden sections, items and widget fields, then empty sections.
    ///
    /// A widget whose fields are all hidden is dropped with them.
    #[must_use]
    pub fn without_hidden(self) -> Self {
        let sections = self
            .sections
            .into_iter()
            .filter(|section| section.access.is_visible())
            .filter_map(|section| {
                let items: Vec<ItemView> = section
                    .items
                    .into_iter()
                    .filter(|item| item.access().is_visible())
                    .filter_map(|item| match item {
                        ItemView::Field(view) => Some(ItemView::Field(view)),
                        ItemView::Widget(mut view) => {
                            let had_fields = !view.fields.is_empty();
                            view.fields.retain(|field| field.access.is_visible());
                            (!had_fields || !view.fields.is_empty()).then_some(ItemView::Widget(view))
                        }
                    })
                    .collect();

                (!items.is_empty()).then_some(SectionView { items, ..section })
            })
            .collect();

        Self {
            step_id: self.step_id,
            sections,
        }
    }

    /// Returns the effective access of a field anywhere in the view.
    #[must_use]
    pub fn field_access(&self, field_id: &str) -> Option<AccessLevel> {
        self.field_views()
            .find(|view| view.field.id() == field_id)
            .map(|view| view.access)
    }

    /// Iterates every field view, standalone and inside widgets, in display order.
    pub fn field_views(&self) -> impl Iterator<Item = &FieldView> {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter())
            .flat_map(|item| match item {
                ItemView::Field(view) => std::slice::from_ref(view).iter(),
                ItemView::Widget(view) => view.fields.iter(),
            })
    }

    /// Returns whether the view shows nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
