use std::collections::BTreeMap;

use fleetbridge_domain::{Feature, FeatureAccess, Permission, Principal, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Current principal summary.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub company_id: Uuid,
    pub is_global: bool,
    pub role_id: Option<String>,
}

impl From<Principal> for MeResponse {
    fn from(value: Principal) -> Self {
        Self {
            id: value.id.to_string(),
            display_name: value.display_name,
            email: value.email,
            company_id: value.company_id.as_uuid(),
            is_global: value.is_global,
            role_id: value.role_id.map(|role_id| role_id.to_string()),
        }
    }
}

/// Full permission decision map for the current principal.
#[derive(Debug, Serialize)]
pub struct PermissionDecisionsResponse {
    pub permissions: BTreeMap<String, bool>,
}

impl PermissionDecisionsResponse {
    pub fn from_decisions(decisions: BTreeMap<Permission, bool>) -> Self {
        Self {
            permissions: decisions
                .into_iter()
                .map(|(permission, granted)| (permission.as_str().to_owned(), granted))
                .collect(),
        }
    }
}

/// Single permission decision.
#[derive(Debug, Serialize)]
pub struct PermissionCheckResponse {
    pub permission: String,
    pub granted: bool,
}

/// Batch evaluation request over explicit permission keys.
#[derive(Debug, Deserialize)]
pub struct AccessQueryRequest {
    pub permissions: Vec<String>,
}

/// Batch evaluation results with aggregate combinators.
#[derive(Debug, Serialize)]
pub struct AccessQueryResponse {
    pub results: BTreeMap<String, bool>,
    pub has_any: bool,
    pub has_all: bool,
}

/// Capability split for one feature.
#[derive(Debug, Serialize)]
pub struct CapabilityResponse {
    pub feature: String,
    pub can_view: bool,
    pub can_manage: bool,
    pub is_view_only: bool,
}

impl CapabilityResponse {
    pub fn from_split(feature: Feature, access: FeatureAccess) -> Self {
        Self {
            feature: feature.as_str().to_owned(),
            can_view: access.can_view,
            can_manage: access.can_manage,
            is_view_only: access.is_view_only,
        }
    }
}

/// API representation of a role document.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub permission_keys: Vec<String>,
    pub is_active: bool,
    pub hidden_for_companies: Vec<Uuid>,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            permission_keys: value.permissions.to_stored(),
            is_active: value.is_active,
            hidden_for_companies: value
                .hidden_for_companies
                .into_iter()
                .map(|company_id| company_id.as_uuid())
                .collect(),
        }
    }
}

/// API representation of a user document.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub is_global: bool,
    pub role_id: Option<String>,
    pub permission_overrides: BTreeMap<String, bool>,
}

impl From<Principal> for UserResponse {
    fn from(value: Principal) -> Self {
        Self {
            id: value.id.to_string(),
            display_name: value.display_name,
            email: value.email,
            is_global: value.is_global,
            role_id: value.role_id.map(|role_id| role_id.to_string()),
            permission_overrides: value
                .permission_overrides
                .into_iter()
                .map(|(permission, granted)| (permission.as_str().to_owned(), granted))
                .collect(),
        }
    }
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub permission_keys: Vec<String>,
}

/// Incoming payload replacing a role's grants.
#[derive(Debug, Deserialize)]
pub struct UpdateRolePermissionsRequest {
    pub permission_keys: Vec<String>,
}

/// Incoming payload toggling role availability.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleActiveRequest {
    pub is_active: bool,
}

/// Incoming payload hiding or unhiding a role for one company.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleVisibilityRequest {
    pub company_id: Uuid,
    pub hidden: bool,
}

/// Incoming payload for role assignment; a null role clears the assignment.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Option<String>,
}

/// Incoming payload recording a permission override.
#[derive(Debug, Deserialize)]
pub struct SaveOverrideRequest {
    pub permission: String,
    pub granted: bool,
}
