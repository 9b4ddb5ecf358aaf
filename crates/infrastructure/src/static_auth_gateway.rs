use std::collections::HashMap;

use async_trait::async_trait;
use fleetbridge_application::AuthGateway;
use fleetbridge_core::AppResult;
use fleetbridge_domain::UserId;

/// Fixed token table for local development.
///
/// Stands in for the hosted auth provider when no provider is reachable;
/// never used in production composition.
#[derive(Default)]
pub struct StaticAuthGateway {
    tokens: HashMap<String, UserId>,
}

impl StaticAuthGateway {
    /// Creates an empty gateway that rejects every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for a subject.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, subject: UserId) -> Self {
        self.tokens.insert(token.into(), subject);
        self
    }
}

#[async_trait]
impl AuthGateway for StaticAuthGateway {
    async fn verify_token(&self, token: &str) -> AppResult<Option<UserId>> {
        Ok(self.tokens.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use fleetbridge_domain::UserId;

    use super::StaticAuthGateway;
    use fleetbridge_application::AuthGateway;

    #[tokio::test]
    async fn registered_token_resolves() {
        let subject = UserId::new("u1").unwrap_or_else(|_| panic!("test user id"));
        let gateway = StaticAuthGateway::new().with_token("tok", subject.clone());

        let resolved = gateway.verify_token("tok").await;
        assert!(resolved.is_ok_and(|value| value == Some(subject)));
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_none() {
        let gateway = StaticAuthGateway::new();
        let resolved = gateway.verify_token("tok").await;
        assert!(resolved.is_ok_and(|value| value.is_none()));
    }
}
