use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use fleetbridge_application::{CreateRoleInput, DirectoryRepository, RoleStore, UserStore};
use fleetbridge_core::{AppError, AppResult, CompanyId};
use fleetbridge_domain::{Permission, PermissionSet, Principal, Role, RoleId, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory directory adapter for development and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    roles: RwLock<HashMap<RoleId, Role>>,
    users: RwLock<HashMap<UserId, Principal>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a role document.
    pub async fn insert_role(&self, role: Role) {
        self.roles.write().await.insert(role.id.clone(), role);
    }

    /// Seeds a user document.
    pub async fn insert_user(&self, user: Principal) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl RoleStore for InMemoryDirectory {
    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(role_id).cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryDirectory {
    async fn find_user(&self, user_id: &UserId) -> AppResult<Option<Principal>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryDirectory {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let role = Role {
            id: RoleId::new(Uuid::new_v4().to_string())?,
            name: input.name.into(),
            permissions: input.permissions,
            is_active: true,
            hidden_for_companies: BTreeSet::new(),
        };

        self.roles
            .write()
            .await
            .insert(role.id.clone(), role.clone());

        Ok(role)
    }

    async fn save_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let role = roles
            .get_mut(role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.permissions = permissions.clone();
        Ok(())
    }

    async fn set_role_active(&self, role_id: &RoleId, is_active: bool) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let role = roles
            .get_mut(role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.is_active = is_active;
        Ok(())
    }

    async fn set_role_hidden_for_company(
        &self,
        role_id: &RoleId,
        company_id: CompanyId,
        hidden: bool,
    ) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let role = roles
            .get_mut(role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        if hidden {
            role.hidden_for_companies.insert(company_id);
        } else {
            role.hidden_for_companies.remove(&company_id);
        }

        Ok(())
    }

    async fn list_users(&self, company_id: CompanyId) -> AppResult<Vec<Principal>> {
        let mut users: Vec<Principal> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.company_id == company_id)
            .cloned()
            .collect();
        users.sort_by(|left, right| left.display_name.cmp(&right.display_name));
        Ok(users)
    }

    async fn assign_role(&self, user_id: &UserId, role_id: Option<&RoleId>) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;
        user.role_id = role_id.cloned();
        Ok(())
    }

    async fn save_permission_override(
        &self,
        user_id: &UserId,
        permission: Permission,
        granted: bool,
    ) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;
        user.permission_overrides.insert(permission, granted);
        Ok(())
    }

    async fn clear_permission_override(
        &self,
        user_id: &UserId,
        permission: Permission,
    ) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;
        user.permission_overrides.remove(&permission);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fleetbridge_application::{CreateRoleInput, DirectoryRepository, RoleStore, UserStore};
    use fleetbridge_core::{CompanyId, NonEmptyString};
    use fleetbridge_domain::{Permission, PermissionSet, Principal, UserId};

    use super::InMemoryDirectory;

    fn user(id: &str, company_id: CompanyId) -> Principal {
        Principal {
            id: UserId::new(id).unwrap_or_else(|_| panic!("test user id")),
            display_name: id.to_owned(),
            email: None,
            company_id,
            is_global: false,
            role_id: None,
            permission_overrides: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn created_role_is_findable() {
        let directory = InMemoryDirectory::new();
        let role = directory
            .create_role(CreateRoleInput {
                name: NonEmptyString::new("Operators")
                    .unwrap_or_else(|_| panic!("test role name")),
                permissions: PermissionSet::from_permissions([Permission::Assets]),
            })
            .await
            .unwrap_or_else(|_| panic!("create must succeed"));

        let found = directory.find_role(&role.id).await;
        assert!(found.is_ok_and(|found| found == Some(role)));
    }

    #[tokio::test]
    async fn user_listing_is_company_scoped() {
        let directory = InMemoryDirectory::new();
        let company_a = CompanyId::new();
        let company_b = CompanyId::new();
        directory.insert_user(user("a", company_a)).await;
        directory.insert_user(user("b", company_b)).await;

        let listed = directory.list_users(company_a).await.unwrap_or_default();
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|user| user.company_id == company_a));
    }

    #[tokio::test]
    async fn missing_user_lookup_is_absent_not_error() {
        let directory = InMemoryDirectory::new();
        let found = directory
            .find_user(&UserId::new("ghost").unwrap_or_else(|_| panic!("test user id")))
            .await;
        assert!(found.is_ok_and(|found| found.is_none()));
    }

    #[tokio::test]
    async fn override_save_and_clear_round_trip() {
        let directory = InMemoryDirectory::new();
        let company_id = CompanyId::new();
        directory.insert_user(user("a", company_id)).await;
        let user_id = UserId::new("a").unwrap_or_else(|_| panic!("test user id"));

        directory
            .save_permission_override(&user_id, Permission::Testing, false)
            .await
            .unwrap_or_else(|_| panic!("save must succeed"));
        let found = directory.find_user(&user_id).await.unwrap_or_default();
        assert!(
            found.is_some_and(|user| user.override_for(Permission::Testing) == Some(false))
        );

        directory
            .clear_permission_override(&user_id, Permission::Testing)
            .await
            .unwrap_or_else(|_| panic!("clear must succeed"));
        let found = directory.find_user(&user_id).await.unwrap_or_default();
        assert!(found.is_some_and(|user| user.permission_overrides.is_empty()));
    }
}
