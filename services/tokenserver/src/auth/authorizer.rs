//! Request-level authorization flow.
//!
//! # Purpose
//! Sequences one token request: service check, login, scope parsing, ACL
//! lookup and evaluation, then token issuance.
//!
//! # Key invariants
//! - No token is issued for another registry or for failed logins.
//! - A request without a scope yields an identity-only token.
//! - A scope without actions is echoed back without consulting the ACL store.
//! - Store errors propagate unchanged; the HTTP layer decides what callers see.
use crate::store::{AccessControlStore, StoreError, UserAuthenticator};
use std::sync::Arc;
use thiserror::Error;
use warden_authz::{
    AuthorizationDecision, AuthzError, IssuedToken, ScopeRequest, TokenIssuer, evaluate,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidLogin,
    #[error("invalid scope format: {0}")]
    InvalidScope(String),
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("access control store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] AuthzError),
}

impl AuthError {
    /// Stable label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            AuthError::InvalidLogin => "invalid_login",
            AuthError::InvalidScope(_) => "invalid_scope",
            AuthError::UnknownService(_) => "unknown_service",
            AuthError::Store(_) => "store_error",
            AuthError::Token(_) => "token_error",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
    pub service: Option<String>,
    pub scope: Option<String>,
    pub client_ip: String,
}

pub struct Authorizer {
    registry_name: String,
    authenticator: Arc<dyn UserAuthenticator>,
    acl_store: Arc<dyn AccessControlStore>,
    issuer: TokenIssuer,
    log_tokens: bool,
}

impl Authorizer {
    pub fn new(
        registry_name: impl Into<String>,
        authenticator: Arc<dyn UserAuthenticator>,
        acl_store: Arc<dyn AccessControlStore>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            registry_name: registry_name.into(),
            authenticator,
            acl_store,
            issuer,
            log_tokens: false,
        }
    }

    pub fn with_token_logging(mut self, enabled: bool) -> Self {
        self.log_tokens = enabled;
        self
    }

    pub fn registry_name(&self) -> &str {
        &self.registry_name
    }

    pub async fn authorize(&self, request: &TokenRequest) -> Result<IssuedToken, AuthError> {
        let service = request.service.as_deref().unwrap_or_default();
        if service != self.registry_name {
            return Err(AuthError::UnknownService(service.to_string()));
        }

        match self
            .authenticator
            .login(&request.username, &request.password)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidLogin),
            Err(err) => {
                tracing::error!(username = %request.username, error = %err, "login backend failed");
                return Err(AuthError::InvalidLogin);
            }
        }

        let access = match request.scope.as_deref().filter(|scope| !scope.is_empty()) {
            None => Vec::new(),
            Some(raw) => {
                let scope = ScopeRequest::parse(raw)
                    .ok_or_else(|| AuthError::InvalidScope(raw.to_string()))?;
                vec![self.decide(&request.username, &request.client_ip, &scope).await?]
            }
        };

        let issued = self.issuer.issue(&request.username, access)?;
        if self.log_tokens {
            tracing::info!(
                subject = %request.username,
                jti = %issued.jti,
                token = %issued.token,
                "issued token"
            );
        } else {
            tracing::debug!(subject = %request.username, jti = %issued.jti, "issued token");
        }
        Ok(issued)
    }

    async fn decide(
        &self,
        username: &str,
        client_ip: &str,
        scope: &ScopeRequest,
    ) -> Result<AuthorizationDecision, AuthError> {
        if !scope.has_actions() {
            return Ok(AuthorizationDecision::echo(scope));
        }
        let entries = self.acl_store.access_control_entries(username).await?;
        let decision = evaluate(client_ip, scope, &entries);
        tracing::debug!(
            %username,
            %client_ip,
            resource = %scope.resource_name,
            requested = %scope.actions,
            granted = %decision.actions,
            "evaluated access"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use warden_authz::{
        AccessControlEntry, ActionSet, KeyManager, KeyMaterial, RegistryClaims, TokenSettings,
    };

    const RSA_PKCS1: &str = include_str!("../../../../crates/warden-authz/testdata/rsa_pkcs1.pem");

    #[derive(Default)]
    struct FakeStore {
        passwords: HashMap<String, String>,
        entries: HashMap<String, Vec<AccessControlEntry>>,
        fail_login: bool,
        acl_lookups: Mutex<usize>,
    }

    #[async_trait]
    impl UserAuthenticator for FakeStore {
        async fn login(&self, username: &str, password: &str) -> StoreResult<bool> {
            if self.fail_login {
                return Err(StoreError::Unexpected(anyhow::anyhow!("backend offline")));
            }
            Ok(self.passwords.get(username).is_some_and(|p| p == password))
        }
    }

    #[async_trait]
    impl AccessControlStore for FakeStore {
        async fn access_control_entries(
            &self,
            username: &str,
        ) -> StoreResult<Vec<AccessControlEntry>> {
            *self.acl_lookups.lock().expect("lock") += 1;
            self.entries
                .get(username)
                .cloned()
                .ok_or_else(|| StoreError::UnknownUser(username.to_string()))
        }
    }

    fn fake_store() -> FakeStore {
        let mut store = FakeStore::default();
        store
            .passwords
            .insert("alice".to_string(), "wonderland".to_string());
        store
            .passwords
            .insert("bob".to_string(), "builder".to_string());
        store.entries.insert(
            "alice".to_string(),
            vec![AccessControlEntry::new(
                "127.0.0.*",
                "alice/*",
                ActionSet::from_tokens(["pull", "push"]),
            )],
        );
        store
    }

    fn authorizer_with(store: Arc<FakeStore>) -> Authorizer {
        let material = KeyMaterial::from_pem(RSA_PKCS1.as_bytes()).expect("key");
        let issuer = TokenIssuer::new(
            TokenSettings::new("warden", "registry.local"),
            Arc::new(KeyManager::with_material(material)),
        );
        Authorizer::new("registry.local", store.clone(), store, issuer)
    }

    fn request(username: &str, password: &str, scope: Option<&str>) -> TokenRequest {
        TokenRequest {
            username: username.to_string(),
            password: password.to_string(),
            service: Some("registry.local".to_string()),
            scope: scope.map(str::to_string),
            client_ip: "127.0.0.1".to_string(),
        }
    }

    fn claims(issued: &IssuedToken) -> RegistryClaims {
        use base64::Engine;
        let payload = issued.token.split('.').nth(1).expect("payload");
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .expect("base64");
        serde_json::from_slice(&bytes).expect("claims")
    }

    #[tokio::test]
    async fn unknown_service_is_rejected() {
        let authorizer = authorizer_with(Arc::new(fake_store()));
        let mut req = request("alice", "wonderland", None);
        req.service = Some("other".to_string());
        let err = authorizer.authorize(&req).await.expect_err("service");
        assert!(matches!(err, AuthError::UnknownService(name) if name == "other"));

        req.service = None;
        let err = authorizer.authorize(&req).await.expect_err("service");
        assert!(matches!(err, AuthError::UnknownService(_)));
    }

    #[tokio::test]
    async fn bad_password_is_invalid_login() {
        let authorizer = authorizer_with(Arc::new(fake_store()));
        let err = authorizer
            .authorize(&request("alice", "nope", Some("repository:alice/app:pull")))
            .await
            .expect_err("login");
        assert!(matches!(err, AuthError::InvalidLogin));
    }

    #[tokio::test]
    async fn login_backend_error_is_invalid_login() {
        let mut store = fake_store();
        store.fail_login = true;
        let authorizer = authorizer_with(Arc::new(store));
        let err = authorizer
            .authorize(&request("alice", "wonderland", None))
            .await
            .expect_err("login");
        assert!(matches!(err, AuthError::InvalidLogin));
    }

    #[tokio::test]
    async fn missing_scope_issues_identity_token() {
        let store = Arc::new(fake_store());
        let authorizer = authorizer_with(store.clone());
        for scope in [None, Some("")] {
            let issued = authorizer
                .authorize(&request("alice", "wonderland", scope))
                .await
                .expect("issue");
            let claims = claims(&issued);
            assert_eq!(claims.sub, "alice");
            assert!(claims.access.is_empty());
        }
        assert_eq!(*store.acl_lookups.lock().expect("lock"), 0);
    }

    #[tokio::test]
    async fn malformed_scope_is_rejected() {
        let authorizer = authorizer_with(Arc::new(fake_store()));
        let err = authorizer
            .authorize(&request("alice", "wonderland", Some("repository:pull")))
            .await
            .expect_err("scope");
        assert!(matches!(err, AuthError::InvalidScope(_)));
    }

    #[tokio::test]
    async fn scope_without_actions_is_echoed() {
        let store = Arc::new(fake_store());
        let authorizer = authorizer_with(store.clone());
        let issued = authorizer
            .authorize(&request("bob", "builder", Some("registry:catalog:")))
            .await
            .expect("issue");
        let claims = claims(&issued);
        assert_eq!(claims.access.len(), 1);
        assert_eq!(claims.access[0].resource_type, "registry");
        assert_eq!(claims.access[0].resource_name, "catalog");
        assert!(claims.access[0].actions.is_empty());
        assert_eq!(*store.acl_lookups.lock().expect("lock"), 0);
    }

    #[tokio::test]
    async fn granted_actions_are_intersected() {
        let authorizer = authorizer_with(Arc::new(fake_store()));
        let issued = authorizer
            .authorize(&request(
                "alice",
                "wonderland",
                Some("repository:alice/app:pull,delete"),
            ))
            .await
            .expect("issue");
        let claims = claims(&issued);
        assert_eq!(claims.access[0].resource_name, "alice/app");
        assert_eq!(claims.access[0].actions.to_vec(), vec!["pull"]);
    }

    #[tokio::test]
    async fn ip_outside_pattern_grants_nothing() {
        let authorizer = authorizer_with(Arc::new(fake_store()));
        let mut req = request("alice", "wonderland", Some("repository:alice/app:pull"));
        req.client_ip = "192.168.1.10".to_string();
        let issued = authorizer.authorize(&req).await.expect("issue");
        assert!(claims(&issued).access[0].actions.is_empty());
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let authorizer = authorizer_with(Arc::new(fake_store()));
        let err = authorizer
            .authorize(&request("bob", "builder", Some("repository:bob/app:pull")))
            .await
            .expect_err("store");
        assert!(matches!(err, AuthError::Store(StoreError::UnknownUser(_))));
        assert_eq!(err.outcome(), "store_error");
    }

    #[tokio::test]
    async fn key_failure_surfaces_token_error() {
        let store = Arc::new(fake_store());
        let issuer = TokenIssuer::new(
            TokenSettings::new("warden", "registry.local"),
            Arc::new(KeyManager::new("/nonexistent/warden/auth.key")),
        );
        let authorizer = Authorizer::new("registry.local", store.clone(), store, issuer)
            .with_token_logging(true);
        let err = authorizer
            .authorize(&request("alice", "wonderland", None))
            .await
            .expect_err("key");
        assert!(matches!(err, AuthError::Token(AuthzError::KeyLoad(_))));
        assert_eq!(err.outcome(), "token_error");
    }
}
