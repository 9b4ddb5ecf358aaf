use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use fleetbridge_application::CreateRoleInput;
use fleetbridge_core::{CompanyId, NonEmptyString};
use fleetbridge_domain::{Permission, PermissionSet, Principal, RoleId, UserId};
use uuid::Uuid;

use crate::dto::{
    AssignRoleRequest, CreateRoleRequest, RoleResponse, SaveOverrideRequest,
    UpdateRoleActiveRequest, UpdateRolePermissionsRequest, UpdateRoleVisibilityRequest,
    UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .directory_service
        .list_roles(&principal)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let name = NonEmptyString::new(payload.name)?;
    let permissions = PermissionSet::from_stored(&payload.permission_keys)?;

    let role = state
        .directory_service
        .create_role(&principal, CreateRoleInput { name, permissions })
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRolePermissionsRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::new(role_id)?;
    let permissions = PermissionSet::from_stored(&payload.permission_keys)?;

    state
        .directory_service
        .update_role_permissions(&principal, &role_id, permissions)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_role_active_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleActiveRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::new(role_id)?;

    state
        .directory_service
        .set_role_active(&principal, &role_id, payload.is_active)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_role_visibility_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleVisibilityRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::new(role_id)?;

    state
        .directory_service
        .set_role_visibility(
            &principal,
            &role_id,
            CompanyId::from_uuid(payload.company_id),
            payload.hidden,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn role_picker_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .directory_service
        .list_roles_for_picker(&principal, CompanyId::from_uuid(company_id))
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .directory_service
        .list_users(&principal, CompanyId::from_uuid(company_id))
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::new(user_id)?;
    let role_id = payload.role_id.map(RoleId::new).transpose()?;

    state
        .directory_service
        .assign_role(&principal, &user_id, role_id.as_ref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_override_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Json(payload): Json<SaveOverrideRequest>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::new(user_id)?;
    let permission = Permission::from_transport(payload.permission.as_str())?;

    state
        .directory_service
        .set_permission_override(&principal, &user_id, permission, payload.granted)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_override_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((user_id, permission)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::new(user_id)?;
    let permission = Permission::from_transport(permission.as_str())?;

    state
        .directory_service
        .clear_permission_override(&principal, &user_id, permission)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
