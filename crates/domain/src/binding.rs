use serde::{Deserialize, Serialize};

/// Placeholder id that configurations authored before steps had server-assigned
/// ids use for "the first step of the workflow".
///
/// Only matches a step whose `order` is 1. No other placeholder ids exist.
pub const LEGACY_FIRST_STEP_ID: &str = "step-1";

/// Ordered set of workflow step ids a field or widget is bound to.
///
/// An empty binding means the item is relevant on every step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StepBinding(Vec<String>);

impl StepBinding {
    /// Creates a binding, trimming ids and dropping blanks and duplicates.
    #[must_use]
    pub fn new<I, S>(step_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for step_id in step_ids {
            let step_id = step_id.into().trim().to_owned();
            if !step_id.is_empty() && !normalized.contains(&step_id) {
                normalized.push(step_id);
            }
        }

        Self(normalized)
    }

    /// Creates a binding that applies to every step.
    #[must_use]
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Returns whether the binding applies to every step.
    #[must_use]
    pub fn is_unbound(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether the binding lists the step id verbatim.
    #[must_use]
    pub fn contains(&self, step_id: &str) -> bool {
        self.0.iter().any(|bound| bound == step_id)
    }

    /// Returns whether the binding uses the legacy first-step placeholder.
    #[must_use]
    pub fn uses_legacy_first_step(&self) -> bool {
        self.contains(LEGACY_FIRST_STEP_ID)
    }

    /// Returns the bound step ids in authoring order.
    #[must_use]
    pub fn step_ids(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for StepBinding {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<StepBinding> for Vec<String> {
    fn from(value: StepBinding) -> Self {
        value.0
    }
}
