use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use fleetbridge_core::{AppError, AppResult};
use fleetbridge_domain::{
    Feature, FeatureAccess, Permission, Principal, Role, RoleId, access,
};
use tokio::sync::RwLock;
use tracing::warn;

/// Store port for role document lookups.
///
/// Backed by a remote document store in production; a missing role is a
/// defined data state, not an error.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Fetches a role document by id.
    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>>;
}

/// Role lookup cache with an explicit lifecycle.
///
/// Constructed once at application start and injected wherever roles are
/// resolved. There is no automatic invalidation on backend mutation; role
/// edits become visible on the next miss or after an explicit [`clear`].
///
/// [`clear`]: RoleCache::clear
#[derive(Default)]
pub struct RoleCache {
    entries: RwLock<HashMap<RoleId, Role>>,
}

impl RoleCache {
    /// Creates an empty role cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached role, if present.
    pub async fn get(&self, role_id: &RoleId) -> Option<Role> {
        self.entries.read().await.get(role_id).cloned()
    }

    /// Caches a resolved role keyed by its id.
    pub async fn put(&self, role: Role) {
        self.entries.write().await.insert(role.id.clone(), role);
    }

    /// Drops every cached role. Idempotent.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Application service answering access questions for principals.
///
/// Wraps the pure evaluator in [`fleetbridge_domain::access`] with cached
/// role resolution. Lookup faults degrade to "role absent" so evaluation
/// stays fail-closed and never surfaces a store error to callers.
#[derive(Clone)]
pub struct AccessService {
    role_store: Arc<dyn RoleStore>,
    role_cache: Arc<RoleCache>,
}

impl AccessService {
    /// Creates a new access service from a role store and an injected cache.
    #[must_use]
    pub fn new(role_store: Arc<dyn RoleStore>, role_cache: Arc<RoleCache>) -> Self {
        Self {
            role_store,
            role_cache,
        }
    }

    /// Decides whether the principal holds the permission.
    pub async fn evaluate(&self, principal: Option<&Principal>, permission: Permission) -> bool {
        let role = self.resolve_role(principal).await;
        access::evaluate(principal, role.as_ref(), permission)
    }

    /// Evaluates each permission independently.
    pub async fn evaluate_many(
        &self,
        principal: Option<&Principal>,
        permissions: &[Permission],
    ) -> BTreeMap<Permission, bool> {
        let role = self.resolve_role(principal).await;
        access::evaluate_many(principal, role.as_ref(), permissions)
    }

    /// Returns true when at least one permission is granted.
    pub async fn has_any(
        &self,
        principal: Option<&Principal>,
        permissions: &[Permission],
    ) -> bool {
        let role = self.resolve_role(principal).await;
        access::has_any(principal, role.as_ref(), permissions)
    }

    /// Returns true when every permission is granted.
    pub async fn has_all(
        &self,
        principal: Option<&Principal>,
        permissions: &[Permission],
    ) -> bool {
        let role = self.resolve_role(principal).await;
        access::has_all(principal, role.as_ref(), permissions)
    }

    /// Derives the view/manage split from an explicit permission pair.
    pub async fn view_manage_split(
        &self,
        principal: Option<&Principal>,
        view: Permission,
        manage: Permission,
    ) -> FeatureAccess {
        let role = self.resolve_role(principal).await;
        access::view_manage_split(principal, role.as_ref(), view, manage)
    }

    /// Derives the capability split for one feature.
    pub async fn feature_access(
        &self,
        principal: Option<&Principal>,
        feature: Feature,
    ) -> FeatureAccess {
        let role = self.resolve_role(principal).await;
        access::feature_access(principal, role.as_ref(), feature)
    }

    /// Resolves the capability split for every gated feature at once.
    pub async fn feature_capabilities(
        &self,
        principal: Option<&Principal>,
    ) -> Vec<(Feature, FeatureAccess)> {
        let role = self.resolve_role(principal).await;
        Feature::all()
            .iter()
            .map(|feature| {
                (
                    *feature,
                    access::feature_access(principal, role.as_ref(), *feature),
                )
            })
            .collect()
    }

    /// Ensures the principal holds the permission.
    pub async fn require_permission(
        &self,
        principal: &Principal,
        permission: Permission,
    ) -> AppResult<()> {
        if self.evaluate(Some(principal), permission).await {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' is missing permission '{}'",
            principal.id,
            permission.as_str()
        )))
    }

    /// Drops every cached role so the next evaluation re-reads the store.
    pub async fn clear_role_cache(&self) {
        self.role_cache.clear().await;
    }

    /// Resolves the principal's role snapshot through the cache.
    ///
    /// Skipped entirely for absent or global principals; their decisions
    /// never depend on the role. A store fault is logged and mapped to
    /// "role absent", which the evaluator treats as deny.
    async fn resolve_role(&self, principal: Option<&Principal>) -> Option<Role> {
        let principal = principal?;
        if principal.is_global {
            return None;
        }
        let role_id = principal.role_id.as_ref()?;

        if let Some(role) = self.role_cache.get(role_id).await {
            return Some(role);
        }

        match self.role_store.find_role(role_id).await {
            Ok(Some(role)) => {
                self.role_cache.put(role.clone()).await;
                Some(role)
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%role_id, %error, "role lookup failed, denying role-derived permissions");
                None
            }
        }
    }
}
