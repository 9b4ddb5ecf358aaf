use std::str::FromStr;

use fleetbridge_core::AppError;

use crate::Permission;

/// Gated platform features, each backed by a view/manage permission pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Company administration.
    Companies,
    /// User administration.
    Users,
    /// Role administration.
    Roles,
    /// Fleet and weighbridge asset registers.
    Assets,
    /// Asset induction wizards.
    Induction,
    /// Testing checklist tracker.
    Testing,
}

impl Feature {
    /// Returns the stable transport value for this feature.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Companies => "companies",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Assets => "assets",
            Self::Induction => "induction",
            Self::Testing => "testing",
        }
    }

    /// Returns all gated features.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Feature] = &[
            Feature::Companies,
            Feature::Users,
            Feature::Roles,
            Feature::Assets,
            Feature::Induction,
            Feature::Testing,
        ];

        ALL
    }

    /// Returns the read-only permission for this feature.
    #[must_use]
    pub fn view_permission(&self) -> Permission {
        match self {
            Self::Companies => Permission::AdminCompaniesView,
            Self::Users => Permission::AdminUsersView,
            Self::Roles => Permission::AdminRolesView,
            Self::Assets => Permission::AssetsView,
            Self::Induction => Permission::InductionView,
            Self::Testing => Permission::TestingView,
        }
    }

    /// Returns the full-control permission for this feature.
    #[must_use]
    pub fn manage_permission(&self) -> Permission {
        match self {
            Self::Companies => Permission::AdminCompanies,
            Self::Users => Permission::AdminUsers,
            Self::Roles => Permission::AdminRoles,
            Self::Assets => Permission::Assets,
            Self::Induction => Permission::Induction,
            Self::Testing => Permission::Testing,
        }
    }

    /// Parses a transport value into a feature.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Feature {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "companies" => Ok(Self::Companies),
            "users" => Ok(Self::Users),
            "roles" => Ok(Self::Roles),
            "assets" => Ok(Self::Assets),
            "induction" => Ok(Self::Induction),
            "testing" => Ok(Self::Testing),
            _ => Err(AppError::Validation(format!("unknown feature '{value}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Feature;

    #[test]
    fn feature_roundtrip_transport_value() {
        for feature in Feature::all() {
            assert_eq!(Feature::from_str(feature.as_str()).ok(), Some(*feature));
        }
    }

    #[test]
    fn view_and_manage_permissions_differ() {
        for feature in Feature::all() {
            assert_ne!(feature.view_permission(), feature.manage_permission());
        }
    }
}
