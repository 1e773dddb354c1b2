use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stepform_core::{AppError, AppResult, NonEmptyString};

/// Named permission group a viewer may hold.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(NonEmptyString);

impl Role {
    /// Creates a validated role name.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into();
        Ok(Self(NonEmptyString::named("role name", name.trim())?))
    }

    /// Returns the role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for Role {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.0.into()
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Non-empty set of roles held by the viewer of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeSet<Role>", into = "BTreeSet<Role>")]
pub struct ViewerRoles(BTreeSet<Role>);

impl ViewerRoles {
    /// Creates a viewer role set, rejecting an empty one.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> AppResult<Self> {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(AppError::Validation(
                "viewer must hold at least one role".to_owned(),
            ));
        }

        Ok(Self(roles))
    }

    /// Parses a comma-separated role list such as `"Approver, Requester"`.
    pub fn parse_list(value: &str) -> AppResult<Self> {
        let roles = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Role::new)
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(roles)
    }

    /// Returns whether the viewer holds the role.
    #[must_use]
    pub fn holds(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    /// Returns whether the viewer holds at least one of the roles.
    #[must_use]
    pub fn holds_any(&self, roles: &BTreeSet<Role>) -> bool {
        roles.iter().any(|role| self.holds(role))
    }

    /// Iterates the held roles in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }
}

impl TryFrom<BTreeSet<Role>> for ViewerRoles {
    type Error = AppError;

    fn try_from(value: BTreeSet<Role>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ViewerRoles> for BTreeSet<Role> {
    fn from(value: ViewerRoles) -> Self {
        value.0
    }
}

/// Role rules attached to a field, widget or section.
///
/// An empty `allowed_roles` set places no restriction on who may see the item.
/// `hide_from_roles` always wins over the allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPermissions {
    /// Roles allowed to see the item; empty means everyone.
    #[serde(default)]
    pub allowed_roles: BTreeSet<Role>,
    /// Allowed roles that may only read the item.
    #[serde(default)]
    pub read_only_roles: BTreeSet<Role>,
    /// Roles the item is hidden from regardless of the allow-list.
    #[serde(default)]
    pub hide_from_roles: BTreeSet<Role>,
}

impl FieldPermissions {
    /// Returns whether no rule is configured at all.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.allowed_roles.is_empty()
            && self.read_only_roles.is_empty()
            && self.hide_from_roles.is_empty()
    }
}

/// Effective visibility and editability of an item for one viewer.
///
/// Variants are ordered from most to least restrictive, so combining two
/// verdicts is taking the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Item is not shown.
    Hidden,
    /// Item is shown without input.
    ReadOnly,
    /// Item is shown and accepts input.
    Editable,
}

impl AccessLevel {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::ReadOnly => "read_only",
            Self::Editable => "editable",
        }
    }

    /// Combines a gating verdict (section, widget) with an item verdict.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        self.min(other)
    }

    /// Returns whether the item is shown at all.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hidden" => Ok(Self::Hidden),
            "read_only" => Ok(Self::ReadOnly),
            "editable" => Ok(Self::Editable),
            _ => Err(AppError::Validation(format!(
                "unknown access level '{value}'"
            ))),
        }
    }
}
