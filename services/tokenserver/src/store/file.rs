//! YAML-backed account store.
//!
//! # Purpose
//! Loads users, password hashes and access control entries from a single
//! accounts file at startup and serves both store traits from memory.
//!
//! # File format
//! ```yaml
//! users:
//!   - username: alice
//!     password: "$2b$12$..."
//!     hash: bcrypt
//!     permissions:
//!       - ip: "**"
//!         repository: "alice/*"
//!         access: [pull, push]
//! ```
//!
//! `hash` defaults to `bcrypt`. `none` stores the password in plain text and
//! logs a warning on every login; it exists for local development only.
//!
//! # Key invariants
//! - Usernames are unique; a duplicate fails the load.
//! - The file is read once; edits require a restart.
use crate::store::{AccessControlStore, StoreError, StoreResult, UserAuthenticator};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use subtle::ConstantTimeEq;
use warden_authz::AccessControlEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordHash {
    None,
    #[default]
    Bcrypt,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub hash: PasswordHash,
    #[serde(default)]
    pub permissions: Vec<AccessControlEntry>,
}

#[derive(Debug, Deserialize)]
struct AccountsFile {
    #[serde(default)]
    users: Vec<UserAccount>,
}

#[derive(Debug, Clone, Default)]
pub struct FileAccountStore {
    users: HashMap<String, UserAccount>,
}

impl FileAccountStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read accounts file: {}", path.display()))?;
        let store = Self::from_yaml(&contents)
            .with_context(|| format!("parse accounts file: {}", path.display()))?;
        tracing::info!(path = %path.display(), users = store.len(), "loaded accounts");
        Ok(store)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let parsed: AccountsFile = serde_yaml::from_str(contents).context("parse accounts yaml")?;
        Self::from_accounts(parsed.users)
    }

    pub fn from_accounts(accounts: Vec<UserAccount>) -> Result<Self> {
        let mut users = HashMap::with_capacity(accounts.len());
        for account in accounts {
            if account.hash == PasswordHash::None {
                tracing::warn!(
                    username = %account.username,
                    "account uses plaintext password hash \"none\""
                );
            }
            let username = account.username.clone();
            if users.insert(username.clone(), account).is_some() {
                bail!("duplicate username in accounts: {username}");
            }
        }
        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserAuthenticator for FileAccountStore {
    async fn login(&self, username: &str, password: &str) -> StoreResult<bool> {
        let Some(account) = self.users.get(username) else {
            return Ok(false);
        };

        match account.hash {
            PasswordHash::None => {
                tracing::warn!(%username, "verifying plaintext password; configure a bcrypt hash");
                Ok(password
                    .as_bytes()
                    .ct_eq(account.password.as_bytes())
                    .into())
            }
            PasswordHash::Bcrypt => {
                let password = password.to_string();
                let expected = account.password.clone();
                let verified =
                    tokio::task::spawn_blocking(move || bcrypt::verify(password, &expected))
                        .await
                        .context("password verification task")?;
                match verified {
                    Ok(ok) => Ok(ok),
                    Err(err) => {
                        tracing::warn!(%username, error = %err, "stored password hash is invalid");
                        Ok(false)
                    }
                }
            }
        }
    }
}

#[async_trait]
impl AccessControlStore for FileAccountStore {
    async fn access_control_entries(
        &self,
        username: &str,
    ) -> StoreResult<Vec<AccessControlEntry>> {
        self.users
            .get(username)
            .map(|account| account.permissions.clone())
            .ok_or_else(|| StoreError::UnknownUser(username.to_string()))
    }
}
