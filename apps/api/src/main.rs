//! Fleetbridge API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use fleetbridge_application::{
    AccessService, AuthGateway, DirectoryRepository, DirectoryService, IdentityService, RoleCache,
    RoleStore, UserStore,
};
use fleetbridge_core::AppError;
use fleetbridge_infrastructure::{
    HttpAuthGateway, HttpDirectory, InMemoryDirectory, StaticAuthGateway,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_config::{ApiConfig, DirectoryProviderConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let (role_store, user_store, directory_repository, auth_gateway): (
        Arc<dyn RoleStore>,
        Arc<dyn UserStore>,
        Arc<dyn DirectoryRepository>,
        Arc<dyn AuthGateway>,
    ) = match &config.directory_provider {
        DirectoryProviderConfig::Hosted(backend) => {
            let http_client = reqwest::Client::new();
            let directory = Arc::new(HttpDirectory::new(
                http_client.clone(),
                backend.base_url.clone(),
                backend.api_key.clone(),
            ));
            let gateway = Arc::new(HttpAuthGateway::new(
                http_client,
                backend.auth_verify_url.clone(),
                backend.api_key.clone(),
            ));

            (directory.clone(), directory.clone(), directory, gateway)
        }
        DirectoryProviderConfig::Memory {
            admin_token,
            company_id,
        } => {
            let directory = Arc::new(InMemoryDirectory::new());
            let admin_subject = dev_seed::seed_directory(&directory, *company_id).await?;
            let gateway = Arc::new(
                StaticAuthGateway::new().with_token(admin_token.clone(), admin_subject),
            );
            info!("using in-memory directory with a seeded development admin");

            (directory.clone(), directory.clone(), directory, gateway)
        }
    };

    // One cache for the process lifetime; cleared through the API only.
    let role_cache = Arc::new(RoleCache::new());
    let access_service = AccessService::new(role_store, role_cache);
    let directory_service = DirectoryService::new(access_service.clone(), directory_repository);
    let identity_service = IdentityService::new(auth_gateway, user_store);

    let app_state = AppState {
        access_service,
        directory_service,
        identity_service,
        frontend_url: config.frontend_url.clone(),
    };

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::access::me_handler))
        .route(
            "/api/access/permissions",
            get(handlers::access::my_permissions_handler),
        )
        .route(
            "/api/access/check",
            get(handlers::access::check_permission_handler),
        )
        .route(
            "/api/access/query",
            post(handlers::access::access_query_handler),
        )
        .route(
            "/api/access/capabilities",
            get(handlers::access::capabilities_handler),
        )
        .route(
            "/api/access/capabilities/{feature}",
            get(handlers::access::feature_capability_handler),
        )
        .route(
            "/api/access/role-cache/clear",
            post(handlers::access::clear_role_cache_handler),
        )
        .route(
            "/api/directory/roles",
            get(handlers::directory::list_roles_handler)
                .post(handlers::directory::create_role_handler),
        )
        .route(
            "/api/directory/roles/{role_id}/permissions",
            put(handlers::directory::update_role_permissions_handler),
        )
        .route(
            "/api/directory/roles/{role_id}/active",
            put(handlers::directory::update_role_active_handler),
        )
        .route(
            "/api/directory/roles/{role_id}/visibility",
            put(handlers::directory::update_role_visibility_handler),
        )
        .route(
            "/api/directory/companies/{company_id}/role-picker",
            get(handlers::directory::role_picker_handler),
        )
        .route(
            "/api/directory/companies/{company_id}/users",
            get(handlers::directory::list_users_handler),
        )
        .route(
            "/api/directory/users/{user_id}/role",
            put(handlers::directory::assign_role_handler),
        )
        .route(
            "/api/directory/users/{user_id}/overrides",
            post(handlers::directory::save_override_handler),
        )
        .route(
            "/api/directory/users/{user_id}/overrides/{permission}",
            delete(handlers::directory::clear_override_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "fleetbridge-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
