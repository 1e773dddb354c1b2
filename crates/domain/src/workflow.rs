use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stepform_core::{AppError, AppResult, NonEmptyString};

/// Party responsible for completing a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponsibleParty {
    /// Ordering party (legacy wire value `AG`).
    #[serde(alias = "AG")]
    PartyA,
    /// Executing party (legacy wire value `AN`).
    #[serde(alias = "AN")]
    PartyB,
}

impl ResponsibleParty {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PartyA => "PartyA",
            Self::PartyB => "PartyB",
        }
    }
}

impl FromStr for ResponsibleParty {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PartyA" | "AG" => Ok(Self::PartyA),
            "PartyB" | "AN" => Ok(Self::PartyB),
            _ => Err(AppError::Validation(format!(
                "unknown responsible party '{value}'"
            ))),
        }
    }
}

/// Estimated step duration in days, finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EstimatedDays(f64);

impl EstimatedDays {
    /// Creates a validated duration.
    pub fn new(days: f64) -> AppResult<Self> {
        if !days.is_finite() || days < 0.0 {
            return Err(AppError::Validation(format!(
                "estimated days must be a finite non-negative number, got {days}"
            )));
        }

        // Folds -0.0 into 0.0.
        Ok(Self(days.abs()))
    }

    /// Returns the number of days.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

// NaN is rejected on construction.
impl Eq for EstimatedDays {}

impl TryFrom<f64> for EstimatedDays {
    type Error = AppError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EstimatedDays> for f64 {
    fn from(value: EstimatedDays) -> Self {
        value.0
    }
}

/// Input payload used to construct a validated workflow step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStepInput {
    /// Step id, unique within the workflow.
    pub id: String,
    /// User-facing step title.
    #[serde(default)]
    pub title: String,
    /// Position in the workflow; 1 is the first step.
    pub order: u32,
    /// Responsible party.
    pub responsible: ResponsibleParty,
    /// Whether the step must be completed.
    #[serde(default)]
    pub required: bool,
    /// Optional estimate in days; fractions are allowed.
    #[serde(default)]
    pub estimated_days: Option<f64>,
    /// Optional parallel group id.
    #[serde(default)]
    pub parallel_group: Option<String>,
    /// Optional convenience flag; must agree with `parallel_group` when supplied.
    #[serde(default)]
    pub is_parallel: Option<bool>,
}

/// One step of an approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WorkflowStepInput")]
pub struct WorkflowStep {
    id: NonEmptyString,
    title: String,
    order: u32,
    responsible: ResponsibleParty,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_days: Option<EstimatedDays>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parallel_group: Option<NonEmptyString>,
    is_parallel: bool,
}

impl WorkflowStep {
    /// Creates a validated workflow step.
    pub fn new(input: WorkflowStepInput) -> AppResult<Self> {
        let WorkflowStepInput {
            id,
            title,
            order,
            responsible,
            required,
            estimated_days,
            parallel_group,
            is_parallel,
        } = input;

        let id = NonEmptyString::named("workflow step id", id)?;

        if order == 0 {
            return Err(AppError::Validation(format!(
                "workflow step '{}' order must be greater than zero",
                id.as_str()
            )));
        }

        let estimated_days = estimated_days
            .map(|days| {
                EstimatedDays::new(days).map_err(|_| {
                    AppError::Validation(format!(
                        "workflow step '{}' estimatedDays must be a finite non-negative number",
                        id.as_str()
                    ))
                })
            })
            .transpose()?;

        let parallel_group = parallel_group
            .map(|group| NonEmptyString::named("parallel group", group))
            .transpose()?;

        if let Some(flag) = is_parallel
            && flag != parallel_group.is_some()
        {
            return Err(AppError::Validation(format!(
                "workflow step '{}' isParallel must match whether parallelGroup is set",
                id.as_str()
            )));
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            order,
            responsible,
            required,
            estimated_days,
            is_parallel: parallel_group.is_some(),
            parallel_group,
        })
    }

    /// Returns step id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns step title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns step order.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Returns responsible party.
    #[must_use]
    pub fn responsible(&self) -> ResponsibleParty {
        self.responsible
    }

    /// Returns whether the step is required.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Returns estimated duration in days.
    #[must_use]
    pub fn estimated_days(&self) -> Option<f64> {
        self.estimated_days.map(EstimatedDays::as_f64)
    }

    /// Returns the parallel group id.
    #[must_use]
    pub fn parallel_group(&self) -> Option<&str> {
        self.parallel_group.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns whether the step belongs to a parallel group.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.is_parallel
    }

    /// Returns whether this is the first step of its workflow.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.order == 1
    }
}

impl TryFrom<WorkflowStepInput> for WorkflowStep {
    type Error = AppError;

    fn try_from(value: WorkflowStepInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Input payload used to construct a validated workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinitionInput {
    /// Workflow id.
    pub id: String,
    /// Requirement type the workflow serves.
    #[serde(rename = "type")]
    pub workflow_type: String,
    /// User-facing workflow name.
    pub name: String,
    /// Workflow steps in any order.
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

/// Immutable approval workflow: steps sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WorkflowDefinitionInput")]
pub struct WorkflowDefinition {
    id: NonEmptyString,
    #[serde(rename = "type")]
    workflow_type: NonEmptyString,
    name: NonEmptyString,
    steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    /// Creates a validated workflow definition.
    pub fn new(input: WorkflowDefinitionInput) -> AppResult<Self> {
        let WorkflowDefinitionInput {
            id,
            workflow_type,
            name,
            mut steps,
        } = input;

        validate_steps(&steps)?;
        steps.sort_by_key(WorkflowStep::order);

        Ok(Self {
            id: NonEmptyString::named("workflow id", id)?,
            workflow_type: NonEmptyString::named("workflow type", workflow_type)?,
            name: NonEmptyString::named("workflow name", name)?,
            steps,
        })
    }

    /// Returns workflow id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the requirement type this workflow serves.
    #[must_use]
    pub fn workflow_type(&self) -> &str {
        self.workflow_type.as_str()
    }

    /// Returns workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns steps sorted by order.
    #[must_use]
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    /// Returns one step by id.
    #[must_use]
    pub fn find_step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.id() == step_id)
    }

    /// Returns every step at order 1 (more than one when the first position is parallel).
    pub fn first_steps(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.steps.iter().filter(|step| step.is_first())
    }

    /// Returns whether the step id names a first step of this workflow.
    #[must_use]
    pub fn is_first_step(&self, step_id: &str) -> bool {
        self.find_step(step_id).is_some_and(WorkflowStep::is_first)
    }
}

impl TryFrom<WorkflowDefinitionInput> for WorkflowDefinition {
    type Error = AppError;

    fn try_from(value: WorkflowDefinitionInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn validate_steps(steps: &[WorkflowStep]) -> AppResult<()> {
    let mut seen_ids = HashSet::new();
    for step in steps {
        if !seen_ids.insert(step.id()) {
            return Err(AppError::Validation(format!(
                "duplicate workflow step id '{}'",
                step.id()
            )));
        }
    }

    // Steps may only share an order when they belong to the same parallel group.
    let mut order_owners: HashMap<u32, (&str, Option<&str>)> = HashMap::new();
    for step in steps {
        match order_owners.entry(step.order()) {
            Entry::Vacant(entry) => {
                entry.insert((step.id(), step.parallel_group()));
            }
            Entry::Occupied(entry) => {
                let (owner_id, owner_group) = *entry.get();
                if owner_group.is_none() || owner_group != step.parallel_group() {
                    return Err(AppError::Validation(format!(
                        "workflow steps '{}' and '{}' share order {} without a common parallel group",
                        owner_id,
                        step.id(),
                        step.order()
                    )));
                }
            }
        }
    }

    Ok(())
}
