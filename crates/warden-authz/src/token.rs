use crate::jti::generate_token_id;
use crate::{AuthorizationDecision, AuthzError, AuthzResult, KeyManager};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
/// Backdating applied to `nbf` to tolerate clock skew between hosts.
pub const NOT_BEFORE_SKEW: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub nbf: i64,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub access: Vec<AuthorizationDecision>,
}

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    /// Registry service name; becomes the `aud` claim.
    pub audience: String,
    pub ttl: Duration,
}

impl TokenSettings {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub issued_at: i64,
    pub expires_in: u64,
}

pub struct TokenIssuer {
    settings: TokenSettings,
    keys: Arc<KeyManager>,
}

impl TokenIssuer {
    pub fn new(settings: TokenSettings, keys: Arc<KeyManager>) -> Self {
        Self { settings, keys }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Sign an RS256 token for `subject` carrying `access` as its access claim.
    ///
    /// The header `kid` is the signing key fingerprint. Nothing is returned
    /// unless the key loads and the token encodes in full.
    pub fn issue(
        &self,
        subject: &str,
        access: Vec<AuthorizationDecision>,
    ) -> AuthzResult<IssuedToken> {
        let key = self.keys.signing_key()?;

        let now = now_epoch_seconds();
        let claims = RegistryClaims {
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            sub: subject.to_string(),
            nbf: now - NOT_BEFORE_SKEW.as_secs() as i64,
            exp: now + self.settings.ttl.as_secs() as i64,
            iat: now,
            jti: generate_token_id(),
            access,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(key.fingerprint().to_string());
        let token = jsonwebtoken::encode(&header, &claims, key.encoding_key())
            .map_err(map_encode_error)?;
        Ok(IssuedToken {
            token,
            jti: claims.jti,
            issued_at: now,
            expires_in: self.settings.ttl.as_secs(),
        })
    }
}

fn map_encode_error(err: jsonwebtoken::errors::Error) -> AuthzError {
    match err.kind() {
        ErrorKind::Json(inner) => AuthzError::Serialization(inner.to_string()),
        _ => AuthzError::Jwt(err),
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
