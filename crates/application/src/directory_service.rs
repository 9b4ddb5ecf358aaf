use std::sync::Arc;

use async_trait::async_trait;
use fleetbridge_core::{AppError, AppResult, CompanyId, NonEmptyString};
use fleetbridge_domain::{Feature, Permission, PermissionSet, Principal, Role, RoleId, UserId};

use crate::AccessService;

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Human-readable role name, validated at construction.
    pub name: NonEmptyString,
    /// Initial grants to attach to the role.
    pub permissions: PermissionSet,
}

/// Repository port for role and user administration.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Lists every role definition.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Creates a role and returns the stored document.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role>;

    /// Replaces a role's grant set.
    async fn save_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: &PermissionSet,
    ) -> AppResult<()>;

    /// Activates or deactivates a role.
    async fn set_role_active(&self, role_id: &RoleId, is_active: bool) -> AppResult<()>;

    /// Hides or unhides a role from one company's role picker.
    async fn set_role_hidden_for_company(
        &self,
        role_id: &RoleId,
        company_id: CompanyId,
        hidden: bool,
    ) -> AppResult<()>;

    /// Lists user documents belonging to a company.
    async fn list_users(&self, company_id: CompanyId) -> AppResult<Vec<Principal>>;

    /// Assigns a role to a user, or clears the assignment.
    async fn assign_role(&self, user_id: &UserId, role_id: Option<&RoleId>) -> AppResult<()>;

    /// Records an explicit grant/deny override for one user and permission.
    async fn save_permission_override(
        &self,
        user_id: &UserId,
        permission: Permission,
        granted: bool,
    ) -> AppResult<()>;

    /// Removes an override so the role's grants apply again.
    async fn clear_permission_override(
        &self,
        user_id: &UserId,
        permission: Permission,
    ) -> AppResult<()>;
}

/// Application service for role and user administration.
///
/// Every operation first checks the acting principal's own capability for
/// the touched feature. Role mutations that change grants clear the role
/// cache so edits reach already-cached users on their next evaluation.
#[derive(Clone)]
pub struct DirectoryService {
    access_service: AccessService,
    repository: Arc<dyn DirectoryRepository>,
}

impl DirectoryService {
    /// Creates a new directory service from required dependencies.
    #[must_use]
    pub fn new(access_service: AccessService, repository: Arc<dyn DirectoryRepository>) -> Self {
        Self {
            access_service,
            repository,
        }
    }

    /// Returns every role definition for administrative listings.
    pub async fn list_roles(&self, actor: &Principal) -> AppResult<Vec<Role>> {
        self.require_view(actor, Feature::Roles).await?;
        self.repository.list_roles().await
    }

    /// Returns the roles a company's picker may offer.
    pub async fn list_roles_for_picker(
        &self,
        actor: &Principal,
        company_id: CompanyId,
    ) -> AppResult<Vec<Role>> {
        self.require_view(actor, Feature::Roles).await?;

        let roles = self.repository.list_roles().await?;
        Ok(roles
            .into_iter()
            .filter(|role| role.is_listed_for(company_id))
            .collect())
    }

    /// Creates a role.
    pub async fn create_role(&self, actor: &Principal, input: CreateRoleInput) -> AppResult<Role> {
        self.require_manage(actor, Feature::Roles).await?;
        self.repository.create_role(input).await
    }

    /// Replaces a role's grant set and invalidates cached roles.
    pub async fn update_role_permissions(
        &self,
        actor: &Principal,
        role_id: &RoleId,
        permissions: PermissionSet,
    ) -> AppResult<()> {
        self.require_manage(actor, Feature::Roles).await?;

        self.repository
            .save_role_permissions(role_id, &permissions)
            .await?;
        self.access_service.clear_role_cache().await;

        Ok(())
    }

    /// Activates or deactivates a role.
    ///
    /// Deactivation only stops new assignments; existing users keep the
    /// role's grants, so the cache is left alone.
    pub async fn set_role_active(
        &self,
        actor: &Principal,
        role_id: &RoleId,
        is_active: bool,
    ) -> AppResult<()> {
        self.require_manage(actor, Feature::Roles).await?;
        self.repository.set_role_active(role_id, is_active).await
    }

    /// Hides or unhides a role from one company's role picker.
    pub async fn set_role_visibility(
        &self,
        actor: &Principal,
        role_id: &RoleId,
        company_id: CompanyId,
        hidden: bool,
    ) -> AppResult<()> {
        self.require_manage(actor, Feature::Roles).await?;
        self.repository
            .set_role_hidden_for_company(role_id, company_id, hidden)
            .await
    }

    /// Lists a company's user documents.
    pub async fn list_users(
        &self,
        actor: &Principal,
        company_id: CompanyId,
    ) -> AppResult<Vec<Principal>> {
        self.require_view(actor, Feature::Users).await?;
        self.repository.list_users(company_id).await
    }

    /// Assigns a role to a user, or clears the assignment.
    pub async fn assign_role(
        &self,
        actor: &Principal,
        user_id: &UserId,
        role_id: Option<&RoleId>,
    ) -> AppResult<()> {
        self.require_manage(actor, Feature::Users).await?;

        if let Some(role_id) = role_id {
            let roles = self.repository.list_roles().await?;
            if !roles.iter().any(|role| &role.id == role_id) {
                return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
            }
        }

        self.repository.assign_role(user_id, role_id).await
    }

    /// Records an explicit grant/deny override for one user.
    pub async fn set_permission_override(
        &self,
        actor: &Principal,
        user_id: &UserId,
        permission: Permission,
        granted: bool,
    ) -> AppResult<()> {
        self.require_manage(actor, Feature::Users).await?;
        self.repository
            .save_permission_override(user_id, permission, granted)
            .await
    }

    /// Removes an override so the user falls back to role grants.
    pub async fn clear_permission_override(
        &self,
        actor: &Principal,
        user_id: &UserId,
        permission: Permission,
    ) -> AppResult<()> {
        self.require_manage(actor, Feature::Users).await?;
        self.repository
            .clear_permission_override(user_id, permission)
            .await
    }

    async fn require_view(&self, actor: &Principal, feature: Feature) -> AppResult<()> {
        let access = self.access_service.feature_access(Some(actor), feature).await;
        if access.can_view {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' may not view {}",
            actor.id,
            feature.as_str()
        )))
    }

    async fn require_manage(&self, actor: &Principal, feature: Feature) -> AppResult<()> {
        let access = self.access_service.feature_access(Some(actor), feature).await;
        if access.can_manage {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' may not manage {}",
            actor.id,
            feature.as_str()
        )))
    }
}
