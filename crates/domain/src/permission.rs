use std::collections::BTreeSet;
use std::str::FromStr;

use fleetbridge_core::{AppError, AppResult};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel stored inside a role's permission list meaning "every permission".
pub const WILDCARD_KEY: &str = "*";

/// Capabilities gated by access checks across the platform.
///
/// Each feature keeps a manage/view pair: the bare key grants full control,
/// the `.view` key grants read-only access. The two are evaluated as wholly
/// independent keys; the pairing is applied by [`crate::view_manage_split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// Manage company records.
    AdminCompanies,
    /// View company records.
    AdminCompaniesView,
    /// Manage user accounts, role assignments and overrides.
    AdminUsers,
    /// View user accounts.
    AdminUsersView,
    /// Manage role definitions.
    AdminRoles,
    /// View role definitions.
    AdminRolesView,
    /// Manage fleet and weighbridge assets.
    Assets,
    /// View fleet and weighbridge assets.
    AssetsView,
    /// Run asset induction wizards.
    Induction,
    /// View induction progress.
    InductionView,
    /// Manage testing checklists.
    Testing,
    /// View testing checklists.
    TestingView,
}

impl Permission {
    /// Returns the stable storage key for this permission.
    ///
    /// Keys are persisted in role and user documents; renaming one is a
    /// breaking migration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdminCompanies => "admin.companies",
            Self::AdminCompaniesView => "admin.companies.view",
            Self::AdminUsers => "admin.users",
            Self::AdminUsersView => "admin.users.view",
            Self::AdminRoles => "admin.roles",
            Self::AdminRolesView => "admin.roles.view",
            Self::Assets => "assets",
            Self::AssetsView => "assets.view",
            Self::Induction => "induction",
            Self::InductionView => "induction.view",
            Self::Testing => "testing",
            Self::TestingView => "testing.view",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::AdminCompanies,
            Permission::AdminCompaniesView,
            Permission::AdminUsers,
            Permission::AdminUsersView,
            Permission::AdminRoles,
            Permission::AdminRolesView,
            Permission::Assets,
            Permission::AssetsView,
            Permission::Induction,
            Permission::InductionView,
            Permission::Testing,
            Permission::TestingView,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin.companies" => Ok(Self::AdminCompanies),
            "admin.companies.view" => Ok(Self::AdminCompaniesView),
            "admin.users" => Ok(Self::AdminUsers),
            "admin.users.view" => Ok(Self::AdminUsersView),
            "admin.roles" => Ok(Self::AdminRoles),
            "admin.roles.view" => Ok(Self::AdminRolesView),
            "assets" => Ok(Self::Assets),
            "assets.view" => Ok(Self::AssetsView),
            "induction" => Ok(Self::Induction),
            "induction.view" => Ok(Self::InductionView),
            "testing" => Ok(Self::Testing),
            "testing.view" => Ok(Self::TestingView),
            _ => Err(AppError::Validation(format!(
                "unknown permission key '{value}'"
            ))),
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_str(value.as_str()).map_err(DeError::custom)
    }
}

/// A role's effective grant set, with optional wildcard semantics.
///
/// Stored role documents carry a list of permission keys that may include
/// [`WILDCARD_KEY`]; unknown keys are rejected when the document crosses
/// into the domain rather than trusted at every call site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    grants_all: bool,
    grants: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Creates an empty grant set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a grant set holding the wildcard.
    #[must_use]
    pub fn all() -> Self {
        Self {
            grants_all: true,
            grants: BTreeSet::new(),
        }
    }

    /// Creates a grant set from explicit permissions.
    pub fn from_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            grants_all: false,
            grants: permissions.into_iter().collect(),
        }
    }

    /// Validates stored permission keys into a grant set.
    pub fn from_stored<S: AsRef<str>>(keys: &[S]) -> AppResult<Self> {
        let mut set = Self::empty();
        for key in keys {
            let key = key.as_ref();
            if key == WILDCARD_KEY {
                set.grants_all = true;
                continue;
            }

            set.grants.insert(Permission::from_str(key)?);
        }

        Ok(set)
    }

    /// Returns whether the set carries the wildcard.
    #[must_use]
    pub fn grants_all(&self) -> bool {
        self.grants_all
    }

    /// Returns whether the permission is granted by wildcard or exact key.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.grants_all || self.grants.contains(&permission)
    }

    /// Returns the stored representation of this set.
    #[must_use]
    pub fn to_stored(&self) -> Vec<String> {
        if self.grants_all {
            return vec![WILDCARD_KEY.to_owned()];
        }

        self.grants
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_stored().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<String>::deserialize(deserializer)?;
        Self::from_stored(&keys).map_err(DeError::custom)
    }
}
