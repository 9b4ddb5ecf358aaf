use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use fleetbridge_core::{AppError, AppResult, CompanyId};
use serde::{Deserialize, Serialize};

use crate::{Permission, RoleId};

/// Unique identifier for a user document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "user id must not be empty".to_owned(),
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

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// An authenticated or contact-only principal subject to access checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier from the auth provider.
    pub id: UserId,
    /// Display name shown in administrative views.
    pub display_name: String,
    /// Contact email, if one is on record.
    pub email: Option<String>,
    /// Company the user belongs to.
    pub company_id: CompanyId,
    /// Global administrators bypass every permission check.
    pub is_global: bool,
    /// Reference to the user's single role, if one is assigned.
    pub role_id: Option<RoleId>,
    /// Per-user grant/deny exceptions layered above the role's grants.
    #[serde(default)]
    pub permission_overrides: BTreeMap<Permission, bool>,
}

impl Principal {
    /// Returns the explicit override for a permission, if one exists.
    #[must_use]
    pub fn override_for(&self, permission: Permission) -> Option<bool> {
        self.permission_overrides.get(&permission).copied()
    }
}
