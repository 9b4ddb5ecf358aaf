//! Adapters for the hosted document store and auth provider.

#![forbid(unsafe_code)]

mod http_auth_gateway;
mod http_directory;
mod in_memory_directory;
mod static_auth_gateway;

pub use http_auth_gateway::HttpAuthGateway;
pub use http_directory::HttpDirectory;
pub use in_memory_directory::InMemoryDirectory;
pub use static_auth_gateway::StaticAuthGateway;
