//! Pure access evaluation over principal, role and permission snapshots.
//!
//! The decision procedure applies a strict authority order:
//! global flag > per-user override > role wildcard > role key > implicit
//! deny. Absent inputs are data, not errors: no user or no role resolves to
//! deny, and evaluation never fails for business reasons.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Feature, Permission, Principal, Role};

/// Decides whether a principal holds a permission.
///
/// Each step short-circuits on a definitive answer. Overrides are consulted
/// before the role so an administrator can revoke one capability from an
/// otherwise all-access role, and the global flag dominates everything,
/// including an explicit deny override.
#[must_use]
pub fn evaluate(
    principal: Option<&Principal>,
    role: Option<&Role>,
    permission: Permission,
) -> bool {
    let Some(principal) = principal else {
        return false;
    };

    if principal.is_global {
        return true;
    }

    if let Some(granted) = principal.override_for(permission) {
        return granted;
    }

    let Some(role) = role else {
        return false;
    };

    role.permissions.contains(permission)
}

/// Evaluates each permission independently.
#[must_use]
pub fn evaluate_many(
    principal: Option<&Principal>,
    role: Option<&Role>,
    permissions: &[Permission],
) -> BTreeMap<Permission, bool> {
    permissions
        .iter()
        .map(|permission| (*permission, evaluate(principal, role, *permission)))
        .collect()
}

/// Returns true when at least one permission is granted; false on an empty
/// list.
#[must_use]
pub fn has_any(
    principal: Option<&Principal>,
    role: Option<&Role>,
    permissions: &[Permission],
) -> bool {
    permissions
        .iter()
        .any(|permission| evaluate(principal, role, *permission))
}

/// Returns true when every permission is granted; vacuously true on an empty
/// list.
#[must_use]
pub fn has_all(
    principal: Option<&Principal>,
    role: Option<&Role>,
    permissions: &[Permission],
) -> bool {
    permissions
        .iter()
        .all(|permission| evaluate(principal, role, *permission))
}

/// Derived capability split for one feature.
///
/// `can_manage` implies `can_view`; `is_view_only` and `can_manage` are
/// mutually exclusive. All three false means "no access", which callers must
/// not render as view-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureAccess {
    /// The principal may observe the feature's data.
    pub can_view: bool,
    /// The principal may mutate the feature's data.
    pub can_manage: bool,
    /// The principal may observe but not mutate.
    pub is_view_only: bool,
}

/// Derives the view/manage capability split from a view and a manage key.
#[must_use]
pub fn view_manage_split(
    principal: Option<&Principal>,
    role: Option<&Role>,
    view: Permission,
    manage: Permission,
) -> FeatureAccess {
    let can_manage = evaluate(principal, role, manage);
    let can_view = can_manage || evaluate(principal, role, view);

    FeatureAccess {
        can_view,
        can_manage,
        is_view_only: can_view && !can_manage,
    }
}

/// Derives the capability split for a feature's own permission pair.
#[must_use]
pub fn feature_access(
    principal: Option<&Principal>,
    role: Option<&Role>,
    feature: Feature,
) -> FeatureAccess {
    view_manage_split(
        principal,
        role,
        feature.view_permission(),
        feature.manage_permission(),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use fleetbridge_core::CompanyId;
    use proptest::prelude::*;

    use super::{evaluate, evaluate_many, has_all, has_any, view_manage_split};
    use crate::{Permission, PermissionSet, Principal, Role, RoleId, UserId};

    fn principal(is_global: bool, role_id: Option<&str>) -> Principal {
        Principal {
            id: UserId::new("u1").unwrap_or_else(|_| panic!("test user id")),
            display_name: "Avery".to_owned(),
            email: None,
            company_id: CompanyId::new(),
            is_global,
            role_id: role_id
                .map(|value| RoleId::new(value).unwrap_or_else(|_| panic!("test role id"))),
            permission_overrides: BTreeMap::new(),
        }
    }

    fn role(id: &str, permissions: PermissionSet) -> Role {
        Role {
            id: RoleId::new(id).unwrap_or_else(|_| panic!("test role id")),
            name: id.to_owned(),
            permissions,
            is_active: true,
            hidden_for_companies: BTreeSet::new(),
        }
    }

    fn permission_strategy() -> impl Strategy<Value = Permission> {
        prop::sample::select(Permission::all().to_vec())
    }

    fn permission_set_strategy() -> impl Strategy<Value = PermissionSet> {
        (
            any::<bool>(),
            prop::collection::btree_set(permission_strategy(), 0..Permission::all().len()),
        )
            .prop_map(|(grants_all, grants)| {
                if grants_all {
                    PermissionSet::all()
                } else {
                    PermissionSet::from_permissions(grants)
                }
            })
    }

    fn override_map_strategy() -> impl Strategy<Value = BTreeMap<Permission, bool>> {
        prop::collection::btree_map(permission_strategy(), any::<bool>(), 0..6)
    }

    #[test]
    fn unauthenticated_caller_is_denied() {
        let role = role("r1", PermissionSet::all());
        assert!(!evaluate(None, Some(&role), Permission::AssetsView));
    }

    #[test]
    fn missing_role_fails_closed() {
        // Non-global user, no override, absent role.
        let user = principal(false, Some("r1"));
        assert!(!evaluate(Some(&user), None, Permission::AdminUsers));
    }

    #[test]
    fn role_key_grants_and_other_keys_deny() {
        let user = principal(false, Some("r1"));
        let role = role(
            "r1",
            PermissionSet::from_permissions([Permission::AdminUsers]),
        );

        assert!(evaluate(Some(&user), Some(&role), Permission::AdminUsers));
        assert!(!evaluate(Some(&user), Some(&role), Permission::AdminRoles));
    }

    #[test]
    fn override_grants_beyond_role() {
        let mut user = principal(false, Some("r1"));
        user.permission_overrides
            .insert(Permission::AdminRoles, true);
        let role = role(
            "r1",
            PermissionSet::from_permissions([Permission::AdminUsers]),
        );

        assert!(evaluate(Some(&user), Some(&role), Permission::AdminRoles));
    }

    #[test]
    fn override_deny_beats_wildcard() {
        let mut user = principal(false, Some("r2"));
        user.permission_overrides
            .insert(Permission::AdminUsers, false);
        let role = role("r2", PermissionSet::all());

        assert!(!evaluate(Some(&user), Some(&role), Permission::AdminUsers));
        assert!(evaluate(Some(&user), Some(&role), Permission::AdminRoles));
    }

    #[test]
    fn view_only_split() {
        let user = principal(false, Some("r1"));
        let role = role(
            "r1",
            PermissionSet::from_permissions([Permission::AssetsView]),
        );

        let access = view_manage_split(
            Some(&user),
            Some(&role),
            Permission::AssetsView,
            Permission::Assets,
        );
        assert!(access.can_view);
        assert!(!access.can_manage);
        assert!(access.is_view_only);
    }

    #[test]
    fn no_access_split_is_not_view_only() {
        let user = principal(false, None);
        let access = view_manage_split(
            Some(&user),
            None,
            Permission::AssetsView,
            Permission::Assets,
        );
        assert!(!access.can_view);
        assert!(!access.can_manage);
        assert!(!access.is_view_only);
    }

    #[test]
    fn absent_role_denies_everything() {
        // Role lookup came back not-found.
        let user = principal(false, Some("gone"));
        for permission in Permission::all() {
            assert!(!evaluate(Some(&user), None, *permission));
        }
    }

    #[test]
    fn empty_aggregates_are_vacuous() {
        let user = principal(false, Some("r1"));
        let role = role("r1", PermissionSet::all());

        assert!(!has_any(Some(&user), Some(&role), &[]));
        assert!(has_all(Some(&user), Some(&role), &[]));
    }

    #[test]
    fn aggregates_follow_individual_grants() {
        let user = principal(false, Some("r1"));
        let partial = role(
            "r1",
            PermissionSet::from_permissions([Permission::Assets]),
        );
        let keys = [Permission::Assets, Permission::AdminUsers];

        assert!(has_any(Some(&user), Some(&partial), &keys));
        assert!(!has_all(Some(&user), Some(&partial), &keys));

        let wildcard = role("r1", PermissionSet::all());
        assert!(has_all(Some(&user), Some(&wildcard), Permission::all()));
    }

    #[test]
    fn evaluate_many_matches_single_evaluations() {
        let mut user = principal(false, Some("r1"));
        user.permission_overrides.insert(Permission::Assets, false);
        let role = role(
            "r1",
            PermissionSet::from_permissions([Permission::Assets, Permission::TestingView]),
        );

        let results = evaluate_many(Some(&user), Some(&role), Permission::all());
        assert_eq!(results.get(&Permission::Assets), Some(&false));
        assert_eq!(results.get(&Permission::TestingView), Some(&true));
        assert_eq!(results.get(&Permission::AdminRoles), Some(&false));
        assert_eq!(results.len(), Permission::all().len());
    }

    proptest! {
        // The global flag dominates every role and override combination.
        #[test]
        fn global_user_is_always_granted(
            permissions in permission_set_strategy(),
            overrides in override_map_strategy(),
            permission in permission_strategy(),
        ) {
            let mut user = principal(true, Some("r1"));
            user.permission_overrides = overrides;
            let role = role("r1", permissions);

            prop_assert!(evaluate(Some(&user), Some(&role), permission));
        }

        // An override is returned verbatim regardless of the role.
        #[test]
        fn override_is_returned_verbatim(
            permissions in permission_set_strategy(),
            permission in permission_strategy(),
            granted in any::<bool>(),
        ) {
            let mut user = principal(false, Some("r1"));
            user.permission_overrides.insert(permission, granted);
            let role = role("r1", permissions);

            prop_assert_eq!(evaluate(Some(&user), Some(&role), permission), granted);
        }

        // The wildcard grants every non-overridden key.
        #[test]
        fn wildcard_grants_all_without_override(permission in permission_strategy()) {
            let user = principal(false, Some("r1"));
            let role = role("r1", PermissionSet::all());

            prop_assert!(evaluate(Some(&user), Some(&role), permission));
        }

        // No override, no wildcard, key absent from the role: deny.
        #[test]
        fn absent_key_is_denied(
            permissions in prop::collection::btree_set(
                permission_strategy(),
                0..Permission::all().len(),
            ),
            permission in permission_strategy(),
        ) {
            prop_assume!(!permissions.contains(&permission));
            let user = principal(false, Some("r1"));
            let role = role("r1", PermissionSet::from_permissions(permissions));

            prop_assert!(!evaluate(Some(&user), Some(&role), permission));
        }

        // Manage implies view in every derived split.
        #[test]
        fn manage_implies_view(
            is_global in any::<bool>(),
            permissions in permission_set_strategy(),
            overrides in override_map_strategy(),
        ) {
            let mut user = principal(is_global, Some("r1"));
            user.permission_overrides = overrides;
            let role = role("r1", permissions);

            let access = view_manage_split(
                Some(&user),
                Some(&role),
                Permission::AssetsView,
                Permission::Assets,
            );
            prop_assert!(!access.can_manage || access.can_view);
            prop_assert!(!(access.is_view_only && access.can_manage));
        }
    }
}
