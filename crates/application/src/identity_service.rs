use std::sync::Arc;

use async_trait::async_trait;
use fleetbridge_core::{AppError, AppResult};
use fleetbridge_domain::{Principal, UserId};

/// Gateway port for the external authentication provider.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Verifies a bearer token and returns the subject it was issued to.
    ///
    /// An invalid or expired token resolves to `None`; only transport or
    /// provider faults are errors.
    async fn verify_token(&self, token: &str) -> AppResult<Option<UserId>>;
}

/// Store port for user document lookups.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetches a user document by id.
    async fn find_user(&self, user_id: &UserId) -> AppResult<Option<Principal>>;
}

/// Application service resolving bearer tokens to principals.
#[derive(Clone)]
pub struct IdentityService {
    auth_gateway: Arc<dyn AuthGateway>,
    user_store: Arc<dyn UserStore>,
}

impl IdentityService {
    /// Creates a new identity service from its collaborator ports.
    #[must_use]
    pub fn new(auth_gateway: Arc<dyn AuthGateway>, user_store: Arc<dyn UserStore>) -> Self {
        Self {
            auth_gateway,
            user_store,
        }
    }

    /// Resolves a bearer token to the principal it belongs to.
    ///
    /// A token the provider does not recognize, or a subject without a user
    /// document, is an unauthorized caller rather than an internal fault.
    pub async fn resolve(&self, token: &str) -> AppResult<Principal> {
        let subject = self
            .auth_gateway
            .verify_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid or expired token".to_owned()))?;

        self.user_store
            .find_user(&subject)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(format!("no user record for subject '{subject}'"))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;

    use async_trait::async_trait;
    use fleetbridge_core::{AppError, AppResult, CompanyId};
    use fleetbridge_domain::{Principal, UserId};

    use super::{AuthGateway, IdentityService, UserStore};

    struct FakeAuthGateway {
        tokens: HashMap<String, UserId>,
    }

    #[async_trait]
    impl AuthGateway for FakeAuthGateway {
        async fn verify_token(&self, token: &str) -> AppResult<Option<UserId>> {
            Ok(self.tokens.get(token).cloned())
        }
    }

    struct FakeUserStore {
        users: HashMap<UserId, Principal>,
    }

    #[async_trait]
    impl UserStore for FakeUserStore {
        async fn find_user(&self, user_id: &UserId) -> AppResult<Option<Principal>> {
            Ok(self.users.get(user_id).cloned())
        }
    }

    fn user_id(value: &str) -> UserId {
        UserId::new(value).unwrap_or_else(|_| panic!("test user id"))
    }

    fn principal(id: &str) -> Principal {
        Principal {
            id: user_id(id),
            display_name: "Avery".to_owned(),
            email: None,
            company_id: CompanyId::new(),
            is_global: false,
            role_id: None,
            permission_overrides: BTreeMap::new(),
        }
    }

    fn service(
        tokens: HashMap<String, UserId>,
        users: HashMap<UserId, Principal>,
    ) -> IdentityService {
        IdentityService::new(
            Arc::new(FakeAuthGateway { tokens }),
            Arc::new(FakeUserStore { users }),
        )
    }

    #[tokio::test]
    async fn known_token_resolves_to_principal() {
        let service = service(
            HashMap::from([("tok".to_owned(), user_id("u1"))]),
            HashMap::from([(user_id("u1"), principal("u1"))]),
        );

        let resolved = service.resolve("tok").await;
        assert!(resolved.is_ok_and(|principal| principal.id == user_id("u1")));
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let service = service(HashMap::new(), HashMap::new());

        let result = service.resolve("tok").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn token_without_user_record_is_unauthorized() {
        let service = service(
            HashMap::from([("tok".to_owned(), user_id("u1"))]),
            HashMap::new(),
        );

        let result = service.resolve("tok").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
