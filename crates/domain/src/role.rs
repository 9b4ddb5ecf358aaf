use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use fleetbridge_core::{AppError, AppResult, CompanyId};
use serde::{Deserialize, Serialize};

use crate::PermissionSet;

/// Unique identifier for a role document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a validated role identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "role id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named, reusable bundle of permission grants assignable to users.
///
/// Roles are referenced, never owned, by users; `is_active` and
/// `hidden_for_companies` only steer company-scoped role pickers and are
/// ignored by access evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Human-readable role name.
    pub name: String,
    /// Effective grants, possibly the wildcard.
    pub permissions: PermissionSet,
    /// Whether the role may be assigned to new users.
    pub is_active: bool,
    /// Companies whose role pickers must not offer this role.
    pub hidden_for_companies: BTreeSet<CompanyId>,
}

impl Role {
    /// Returns whether a company's role picker should offer this role.
    #[must_use]
    pub fn is_listed_for(&self, company_id: CompanyId) -> bool {
        self.is_active && !self.hidden_for_companies.contains(&company_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use fleetbridge_core::CompanyId;

    use super::{Role, RoleId};
    use crate::PermissionSet;

    fn role(id: &str) -> Role {
        Role {
            id: RoleId::new(id).unwrap_or_else(|_| panic!("test role id")),
            name: "Operators".to_owned(),
            permissions: PermissionSet::empty(),
            is_active: true,
            hidden_for_companies: BTreeSet::new(),
        }
    }

    #[test]
    fn empty_role_id_is_rejected() {
        assert!(RoleId::new("  ").is_err());
    }

    #[test]
    fn inactive_role_is_not_listed() {
        let mut role = role("r1");
        role.is_active = false;
        assert!(!role.is_listed_for(CompanyId::new()));
    }

    #[test]
    fn hidden_role_is_not_listed_for_that_company() {
        let company_id = CompanyId::new();
        let mut role = role("r1");
        role.hidden_for_companies.insert(company_id);
        assert!(!role.is_listed_for(company_id));
        assert!(role.is_listed_for(CompanyId::new()));
    }
}
