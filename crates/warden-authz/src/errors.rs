use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("failed to load signing key: {0}")]
    KeyLoad(String),
    #[error("signing key is not an RSA private key")]
    NotRsaKey,
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::KeyLoad("missing file".to_string()),
            AuthzError::NotRsaKey,
            AuthzError::Pattern(regex::Error::Syntax("unclosed group".to_string())),
            AuthzError::Serialization("key must be a string".to_string()),
            AuthzError::Jwt(jsonwebtoken::errors::ErrorKind::InvalidRsaKey("bad".into()).into()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn key_load_message_carries_context() {
        let err = AuthzError::KeyLoad("no PEM block in auth.key".to_string());
        assert_eq!(
            err.to_string(),
            "failed to load signing key: no PEM block in auth.key"
        );
    }
}
