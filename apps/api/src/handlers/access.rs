use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use fleetbridge_domain::{Feature, Permission, Principal};
use serde::Deserialize;

use crate::dto::{
    AccessQueryRequest, AccessQueryResponse, CapabilityResponse, MeResponse,
    PermissionCheckResponse, PermissionDecisionsResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn me_handler(
    Extension(principal): Extension<Principal>,
) -> Json<MeResponse> {
    Json(MeResponse::from(principal))
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Json<PermissionDecisionsResponse> {
    let decisions = state
        .access_service
        .evaluate_many(Some(&principal), Permission::all())
        .await;

    Json(PermissionDecisionsResponse::from_decisions(decisions))
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    permission: String,
}

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<CheckParams>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let permission = Permission::from_transport(params.permission.as_str())?;
    let granted = state.access_service.evaluate(Some(&principal), permission).await;

    Ok(Json(PermissionCheckResponse {
        permission: permission.as_str().to_owned(),
        granted,
    }))
}

pub async fn access_query_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AccessQueryRequest>,
) -> ApiResult<Json<AccessQueryResponse>> {
    let permissions = payload
        .permissions
        .iter()
        .map(|value| Permission::from_transport(value.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let results = state
        .access_service
        .evaluate_many(Some(&principal), &permissions)
        .await;
    let has_any = state.access_service.has_any(Some(&principal), &permissions).await;
    let has_all = state.access_service.has_all(Some(&principal), &permissions).await;

    Ok(Json(AccessQueryResponse {
        results: results
            .into_iter()
            .map(|(permission, granted)| (permission.as_str().to_owned(), granted))
            .collect(),
        has_any,
        has_all,
    }))
}

pub async fn capabilities_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Json<Vec<CapabilityResponse>> {
    let capabilities = state
        .access_service
        .feature_capabilities(Some(&principal))
        .await
        .into_iter()
        .map(|(feature, access)| CapabilityResponse::from_split(feature, access))
        .collect();

    Json(capabilities)
}

pub async fn feature_capability_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(feature): Path<String>,
) -> ApiResult<Json<CapabilityResponse>> {
    let feature = Feature::from_transport(feature.as_str())?;
    let access = state
        .access_service
        .feature_access(Some(&principal), feature)
        .await;

    Ok(Json(CapabilityResponse::from_split(feature, access)))
}

pub async fn clear_role_cache_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<StatusCode> {
    state
        .access_service
        .require_permission(&principal, Permission::AdminRoles)
        .await?;
    state.access_service.clear_role_cache().await;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Arc;

    use axum::extract::{Extension, Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use fleetbridge_application::{AccessService, DirectoryService, IdentityService, RoleCache};
    use fleetbridge_core::CompanyId;
    use fleetbridge_domain::{Permission, PermissionSet, Principal, Role, RoleId, UserId};
    use fleetbridge_infrastructure::{InMemoryDirectory, StaticAuthGateway};

    use super::{CheckParams, check_permission_handler, clear_role_cache_handler};
    use crate::state::AppState;

    fn role_id(value: &str) -> RoleId {
        RoleId::new(value).unwrap_or_else(|_| panic!("test role id"))
    }

    fn role(id: &str, permissions: PermissionSet) -> Role {
        Role {
            id: role_id(id),
            name: id.to_owned(),
            permissions,
            is_active: true,
            hidden_for_companies: BTreeSet::new(),
        }
    }

    fn principal(is_global: bool, role: Option<&str>) -> Principal {
        Principal {
            id: UserId::new("u1").unwrap_or_else(|_| panic!("test user id")),
            display_name: "Avery".to_owned(),
            email: None,
            company_id: CompanyId::new(),
            is_global,
            role_id: role.map(role_id),
            permission_overrides: BTreeMap::new(),
        }
    }

    async fn app_state(roles: Vec<Role>) -> AppState {
        let directory = Arc::new(InMemoryDirectory::new());
        for role in roles {
            directory.insert_role(role).await;
        }

        let access_service = AccessService::new(directory.clone(), Arc::new(RoleCache::new()));
        let directory_service = DirectoryService::new(access_service.clone(), directory.clone());
        let identity_service = IdentityService::new(Arc::new(StaticAuthGateway::new()), directory);

        AppState {
            access_service,
            directory_service,
            identity_service,
            frontend_url: "http://localhost:3000".to_owned(),
        }
    }

    #[tokio::test]
    async fn unknown_permission_key_maps_to_bad_request() {
        let state = app_state(Vec::new()).await;

        let result = check_permission_handler(
            State(state),
            Extension(principal(true, None)),
            Query(CheckParams {
                permission: "admin.bogus".to_owned(),
            }),
        )
        .await;

        let status = result
            .map(|_| StatusCode::OK)
            .unwrap_or_else(|error| error.into_response().status());
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cache_clear_is_forbidden_without_role_admin() {
        let viewer = role(
            "viewer",
            PermissionSet::from_permissions([Permission::AdminRolesView]),
        );
        let state = app_state(vec![viewer]).await;

        let result = clear_role_cache_handler(
            State(state),
            Extension(principal(false, Some("viewer"))),
        )
        .await;

        let status = result.unwrap_or_else(|error| error.into_response().status());
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn cache_clear_succeeds_for_role_admin() {
        let admin = role(
            "admin",
            PermissionSet::from_permissions([Permission::AdminRoles]),
        );
        let state = app_state(vec![admin]).await;

        let result = clear_role_cache_handler(
            State(state),
            Extension(principal(false, Some("admin"))),
        )
        .await;

        let status = result.unwrap_or_else(|error| error.into_response().status());
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
