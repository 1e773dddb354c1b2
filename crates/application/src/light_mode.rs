use crate::binding_resolver::{ResolvedItem, ResolvedSection, ResolvedStep};
use crate::step_view::{ItemView, SectionView, StepFormView};

/// Narrowing to the abbreviated light-mode form.
///
/// Only fields flagged `lightModeVisible` survive. Widgets carry no flag of
/// their own: a widget is kept while at least one of its fields survives.
/// Sections left without items are dropped. Applying the filter twice is the
/// same as applying it once.
pub trait LightModeFilter: Sized {
    /// Returns the light-mode subset, or `self` unchanged when inactive.
    #[must_use]
    fn apply_light_mode(self, active: bool) -> Self;
}

/// Applies the light-mode filter to a resolved or annotated step.
#[must_use]
pub fn apply_light_mode<T: LightModeFilter>(resolved: T, active: bool) -> T {
    resolved.apply_light_mode(active)
}

impl LightModeFilter for ResolvedStep {
    fn apply_light_mode(self, active: bool) -> Self {
        if !active {
            return self;
        }

        let step_id = self.step_id().to_owned();
        let sections = self
            .into_sections()
            .into_iter()
            .filter_map(|section| {
                let items: Vec<ResolvedItem> = section
                    .items
                    .into_iter()
                    .filter_map(|item| match item {
                        ResolvedItem::StandaloneField(field) => field
                            .light_mode_visible()
                            .then_some(ResolvedItem::StandaloneField(field)),
                        ResolvedItem::Widget(widget) => {
                            let narrowed = widget.with_fields_filtered(|field| field.light_mode_visible());
                            (!narrowed.fields().is_empty()).then_some(ResolvedItem::Widget(narrowed))
                        }
                    })
                    .collect();

                (!items.is_empty()).then_some(ResolvedSection { items, ..section })
            })
            .collect();

        ResolvedStep::new(step_id, sections)
    }
}

impl LightModeFilter for StepFormView {
    fn apply_light_mode(self, active: bool) -> Self {
        if !active {
            return self;
        }

        let sections = self
            .sections
            .into_iter()
            .filter_map(|section| {
                let items: Vec<ItemView> = section
                    .items
                    .into_iter()
                    .filter_map(|item| match item {
                        ItemView::Field(view) => view
                            .field
                            .light_mode_visible()
                            .then_some(ItemView::Field(view)),
                        ItemView::Widget(mut view) => {
                            view.fields.retain(|field| field.field.light_mode_visible());
                            (!view.fields.is_empty()).then_some(ItemView::Widget(view))
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
}
