use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use fleetbridge_core::{AppError, CompanyId};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Connection settings for the hosted document store and auth provider.
#[derive(Debug, Clone)]
pub struct HostedBackendConfig {
    pub base_url: Url,
    pub api_key: String,
    pub auth_verify_url: Url,
}

/// Directory backing selected at startup.
#[derive(Debug, Clone)]
pub enum DirectoryProviderConfig {
    /// Seeded in-memory directory for local development.
    Memory {
        admin_token: String,
        company_id: Option<CompanyId>,
    },
    /// Hosted document store and auth provider.
    Hosted(HostedBackendConfig),
}

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub directory_provider: DirectoryProviderConfig,
}

impl ApiConfig {
    /// Loads and validates configuration from environment variables.
    pub fn load() -> Result<Self, AppError> {
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let directory_provider = match env::var("DIRECTORY_PROVIDER")
            .unwrap_or_else(|_| "hosted".to_owned())
            .as_str()
        {
            "hosted" => {
                // Joining collection paths needs a trailing slash on the base.
                let mut base_url = required_url_env("BACKEND_BASE_URL")?;
                if !base_url.path().ends_with('/') {
                    let path = format!("{}/", base_url.path());
                    base_url.set_path(&path);
                }
                let auth_verify_url = required_url_env("AUTH_VERIFY_URL")?;
                DirectoryProviderConfig::Hosted(HostedBackendConfig {
                    base_url,
                    api_key: required_non_empty_env("BACKEND_API_KEY")?,
                    auth_verify_url,
                })
            }
            "memory" => {
                let company_id = env::var("DEV_COMPANY_ID")
                    .ok()
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| {
                        uuid::Uuid::parse_str(value.as_str())
                            .map(CompanyId::from_uuid)
                            .map_err(|error| {
                                AppError::Validation(format!("invalid DEV_COMPANY_ID: {error}"))
                            })
                    })
                    .transpose()?;

                DirectoryProviderConfig::Memory {
                    admin_token: required_non_empty_env("DEV_ADMIN_TOKEN")?,
                    company_id,
                }
            }
            other => {
                return Err(AppError::Validation(format!(
                    "DIRECTORY_PROVIDER must be either 'hosted' or 'memory', got '{other}'"
                )));
            }
        };

        Ok(Self {
            frontend_url,
            api_host,
            api_port,
            directory_provider,
        })
    }

    /// Returns the socket address the API binds to.
    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

/// Installs the process-wide tracing subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn required_url_env(name: &str) -> Result<Url, AppError> {
    let value = required_non_empty_env(name)?;
    Url::parse(&value).map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
}
