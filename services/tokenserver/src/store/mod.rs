//! Credential and access control store contracts.
//!
//! # Purpose
//! Defines the two collaborators the token endpoint depends on: one that
//! checks a username/password pair and one that returns a user's access
//! control entries. The authorizer only sees these traits, so alternative
//! backends plug in without touching request handling.
//!
//! # Notes
//! Implementations may block on I/O; callers treat every method as fallible
//! and do not retry.
use async_trait::async_trait;
use thiserror::Error;
use warden_authz::AccessControlEntry;

pub mod file;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user does not exist: {0}")]
    UnknownUser(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserAuthenticator: Send + Sync {
    /// `Ok(false)` for unknown users and wrong passwords alike.
    async fn login(&self, username: &str, password: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait AccessControlStore: Send + Sync {
    /// Fails with [`StoreError::UnknownUser`] when `username` is not configured.
    async fn access_control_entries(&self, username: &str)
    -> StoreResult<Vec<AccessControlEntry>>;
}
