use std::collections::{BTreeMap, BTreeSet};

use fleetbridge_core::{AppResult, CompanyId};
use fleetbridge_domain::{Permission, PermissionSet, Principal, Role, RoleId, UserId};
use fleetbridge_infrastructure::InMemoryDirectory;
use tracing::info;

/// Seeds the in-memory directory with a development company, two roles and a
/// global admin, returning the admin's subject id.
pub async fn seed_directory(
    directory: &InMemoryDirectory,
    company_id: Option<CompanyId>,
) -> AppResult<UserId> {
    let company_id = company_id.unwrap_or_default();

    let admin_role_id = RoleId::new("administrator")?;
    directory
        .insert_role(Role {
            id: admin_role_id.clone(),
            name: "Administrator".to_owned(),
            permissions: PermissionSet::all(),
            is_active: true,
            hidden_for_companies: BTreeSet::new(),
        })
        .await;

    directory
        .insert_role(Role {
            id: RoleId::new("site-operator")?,
            name: "Site Operator".to_owned(),
            permissions: PermissionSet::from_permissions([
                Permission::Assets,
                Permission::AssetsView,
                Permission::InductionView,
                Permission::TestingView,
            ]),
            is_active: true,
            hidden_for_companies: BTreeSet::new(),
        })
        .await;

    let admin = Principal {
        id: UserId::new("dev-admin")?,
        display_name: "Development Admin".to_owned(),
        email: None,
        company_id,
        is_global: true,
        role_id: Some(admin_role_id),
        permission_overrides: BTreeMap::new(),
    };
    let subject = admin.id.clone();
    directory.insert_user(admin).await;

    info!(%company_id, "seeded development directory");
    Ok(subject)
}
