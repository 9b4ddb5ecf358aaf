use std::collections::BTreeMap;

use async_trait::async_trait;
use fleetbridge_application::{CreateRoleInput, DirectoryRepository, RoleStore, UserStore};
use fleetbridge_core::{AppError, AppResult, CompanyId};
use fleetbridge_domain::{
    Permission, PermissionSet, Principal, Role, RoleId, UserId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;
use url::Url;
use uuid::Uuid;

/// Role document shape owned by the hosted backend.
#[derive(Debug, Serialize, Deserialize)]
struct RoleRecord {
    id: String,
    name: String,
    permission_keys: Vec<String>,
    is_active: bool,
    #[serde(default)]
    hidden_for_companies: Vec<Uuid>,
}

impl RoleRecord {
    fn into_domain(self) -> AppResult<Role> {
        Ok(Role {
            id: RoleId::new(self.id)?,
            name: self.name,
            permissions: PermissionSet::from_stored(&self.permission_keys)?,
            is_active: self.is_active,
            hidden_for_companies: self
                .hidden_for_companies
                .into_iter()
                .map(CompanyId::from_uuid)
                .collect(),
        })
    }
}

/// User document shape owned by the hosted backend.
#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    id: String,
    display_name: String,
    email: Option<String>,
    company_id: Uuid,
    is_global: bool,
    role_id: Option<String>,
    #[serde(default)]
    permission_overrides: BTreeMap<String, bool>,
}

impl UserRecord {
    fn into_domain(self) -> AppResult<Principal> {
        let mut permission_overrides = BTreeMap::new();
        for (key, granted) in self.permission_overrides {
            permission_overrides.insert(Permission::from_transport(key.as_str())?, granted);
        }

        Ok(Principal {
            id: UserId::new(self.id)?,
            display_name: self.display_name,
            email: self.email,
            company_id: CompanyId::from_uuid(self.company_id),
            is_global: self.is_global,
            role_id: self.role_id.map(RoleId::new).transpose()?,
            permission_overrides,
        })
    }
}

/// HTTP adapter for the hosted document store's role and user collections.
pub struct HttpDirectory {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl HttpDirectory {
    /// Creates a new adapter against a backend base URL.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid document store endpoint '{path}': {error}"))
        })
    }

    async fn fetch_document<T: DeserializeOwned>(&self, path: &str) -> AppResult<Option<T>> {
        let response = self
            .http_client
            .get(self.endpoint(path)?)
            .header("X-Api-Key", self.api_key.as_str())
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let document = response.json::<T>().await.map_err(|error| {
            AppError::Internal(format!("malformed document store response: {error}"))
        })?;

        Ok(Some(document))
    }

    async fn patch_document(&self, path: &str, body: Value) -> AppResult<()> {
        let response = self
            .http_client
            .patch(self.endpoint(path)?)
            .header("X-Api-Key", self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("document '{path}' does not exist")));
        }

        check_status(response).await?;
        Ok(())
    }

    async fn load_role_record(&self, role_id: &RoleId) -> AppResult<RoleRecord> {
        self.fetch_document::<RoleRecord>(&format!("roles/{role_id}"))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    async fn load_user_record(&self, user_id: &UserId) -> AppResult<UserRecord> {
        self.fetch_document::<UserRecord>(&format!("users/{user_id}"))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
    }
}

#[async_trait]
impl RoleStore for HttpDirectory {
    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        let record = self
            .fetch_document::<RoleRecord>(&format!("roles/{role_id}"))
            .await?;

        record.map(RoleRecord::into_domain).transpose()
    }
}

#[async_trait]
impl UserStore for HttpDirectory {
    async fn find_user(&self, user_id: &UserId) -> AppResult<Option<Principal>> {
        let record = self
            .fetch_document::<UserRecord>(&format!("users/{user_id}"))
            .await?;

        record.map(UserRecord::into_domain).transpose()
    }
}

#[async_trait]
impl DirectoryRepository for HttpDirectory {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let records = self
            .fetch_document::<Vec<RoleRecord>>("roles")
            .await?
            .unwrap_or_default();

        records
            .into_iter()
            .map(RoleRecord::into_domain)
            .collect::<AppResult<Vec<_>>>()
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let response = self
            .http_client
            .post(self.endpoint("roles")?)
            .header("X-Api-Key", self.api_key.as_str())
            .json(&json!({
                "name": input.name.as_str(),
                "permission_keys": input.permissions.to_stored(),
                "is_active": true,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        let record = response.json::<RoleRecord>().await.map_err(|error| {
            AppError::Internal(format!("malformed role document in response: {error}"))
        })?;

        record.into_domain()
    }

    async fn save_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: &PermissionSet,
    ) -> AppResult<()> {
        self.patch_document(
            &format!("roles/{role_id}"),
            json!({ "permission_keys": permissions.to_stored() }),
        )
        .await
    }

    async fn set_role_active(&self, role_id: &RoleId, is_active: bool) -> AppResult<()> {
        self.patch_document(&format!("roles/{role_id}"), json!({ "is_active": is_active }))
            .await
    }

    async fn set_role_hidden_for_company(
        &self,
        role_id: &RoleId,
        company_id: CompanyId,
        hidden: bool,
    ) -> AppResult<()> {
        // Last write wins on the whole array; concurrent visibility edits
        // are resolved by the backend, not here.
        let record = self.load_role_record(role_id).await?;
        let mut companies = record.hidden_for_companies;
        if hidden {
            if !companies.contains(&company_id.as_uuid()) {
                companies.push(company_id.as_uuid());
            }
        } else {
            companies.retain(|value| *value != company_id.as_uuid());
        }

        self.patch_document(
            &format!("roles/{role_id}"),
            json!({ "hidden_for_companies": companies }),
        )
        .await
    }

    async fn list_users(&self, company_id: CompanyId) -> AppResult<Vec<Principal>> {
        let records = self
            .fetch_document::<Vec<UserRecord>>(&format!("users?company_id={company_id}"))
            .await?
            .unwrap_or_default();

        records
            .into_iter()
            .map(UserRecord::into_domain)
            .collect::<AppResult<Vec<_>>>()
    }

    async fn assign_role(&self, user_id: &UserId, role_id: Option<&RoleId>) -> AppResult<()> {
        self.patch_document(
            &format!("users/{user_id}"),
            json!({ "role_id": role_id.map(RoleId::as_str) }),
        )
        .await
    }

    async fn save_permission_override(
        &self,
        user_id: &UserId,
        permission: Permission,
        granted: bool,
    ) -> AppResult<()> {
        let record = self.load_user_record(user_id).await?;
        let mut overrides = record.permission_overrides;
        overrides.insert(permission.as_str().to_owned(), granted);

        self.patch_document(
            &format!("users/{user_id}"),
            json!({ "permission_overrides": overrides }),
        )
        .await
    }

    async fn clear_permission_override(
        &self,
        user_id: &UserId,
        permission: Permission,
    ) -> AppResult<()> {
        let record = self.load_user_record(user_id).await?;
        let mut overrides = record.permission_overrides;
        overrides.remove(permission.as_str());

        self.patch_document(
            &format!("users/{user_id}"),
            json!({ "permission_overrides": overrides }),
        )
        .await
    }
}

fn transport_error(error: reqwest::Error) -> AppError {
    AppError::Internal(format!("document store request failed: {error}"))
}

async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
    warn!(%status, "document store returned an error response");

    Err(AppError::Internal(format!(
        "document store returned status {status}: {body}"
    )))
}
