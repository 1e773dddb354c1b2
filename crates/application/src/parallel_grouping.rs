use std::collections::HashSet;

use serde::Serialize;
use stepform_domain::{WorkflowDefinition, WorkflowStep};

/// One entry of the workflow outline: a lone step or a parallel group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayUnit {
    /// Step without a parallel group.
    Single {
        /// The step.
        step: WorkflowStep,
    },
    /// Every step sharing one parallel group id, in workflow order.
    Parallel {
        /// Shared parallel group id.
        group_id: String,
        /// Member steps; never empty.
        steps: Vec<WorkflowStep>,
    },
}

impl DisplayUnit {
    /// Returns the steps of this unit.
    #[must_use]
    pub fn steps(&self) -> &[WorkflowStep] {
        match self {
            Self::Single { step } => std::slice::from_ref(step),
            Self::Parallel { steps, .. } => steps,
        }
    }

    /// Returns the lowest step order within this unit.
    #[must_use]
    pub fn min_order(&self) -> u32 {
        self.steps()
            .iter()
            .map(WorkflowStep::order)
            .min()
            .unwrap_or_default()
    }

    /// Returns whether this unit is a parallel group.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel { .. })
    }
}

/// Groups workflow steps into display units.
///
/// A group is emitted once, at the position of its first member, and collects
/// every step of the workflow sharing its id, adjacent or not. A group with a
/// single member is still a [`DisplayUnit::Parallel`].
#[must_use]
pub fn group_parallel(workflow: &WorkflowDefinition) -> Vec<DisplayUnit> {
    let steps = workflow.steps();
    let mut emitted_groups: HashSet<&str> = HashSet::new();
    let mut units = Vec::with_capacity(steps.len());

    for step in steps {
        let Some(group_id) = step.parallel_group() else {
            units.push(DisplayUnit::Single { step: step.clone() });
            continue;
        };

        if !emitted_groups.insert(group_id) {
            continue;
        }

        let members = steps
            .iter()
            .filter(|candidate| candidate.parallel_group() == Some(group_id))
            .cloned()
            .collect();
        units.push(DisplayUnit::Parallel {
            group_id: group_id.to_owned(),
            steps: members,
        });
    }

    units
}
