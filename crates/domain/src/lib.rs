//! Domain entities and the access evaluation core.

#![forbid(unsafe_code)]

pub mod access;
mod feature;
mod permission;
mod principal;
mod role;

pub use access::{
    FeatureAccess, evaluate, evaluate_many, feature_access, has_all, has_any, view_manage_split,
};
pub use feature::Feature;
pub use permission::{Permission, PermissionSet, WILDCARD_KEY};
pub use principal::{Principal, UserId};
pub use role::{Role, RoleId};
