//! Application services and ports.

#![forbid(unsafe_code)]

mod access_service;
mod directory_service;
mod identity_service;

pub use access_service::{AccessService, RoleCache, RoleStore};
pub use directory_service::{CreateRoleInput, DirectoryRepository, DirectoryService};
pub use identity_service::{AuthGateway, IdentityService, UserStore};
