use fleetbridge_application::{AccessService, DirectoryService, IdentityService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_service: AccessService,
    pub directory_service: DirectoryService,
    pub identity_service: IdentityService,
    pub frontend_url: String,
}
