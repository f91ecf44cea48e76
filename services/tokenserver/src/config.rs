use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

// Defaults applied when neither the environment nor the YAML file set a value.
const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
const DEFAULT_REGISTRY_NAME: &str = "registry";
const DEFAULT_ISSUER: &str = "warden";
const DEFAULT_SIGNING_KEY: &str = "auth.key";
const DEFAULT_ACCOUNTS: &str = "accounts.yaml";
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

// Token server configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct TokenServerConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    // Registry service name; requests for any other service are rejected.
    pub registry_name: String,
    pub issuer: String,
    pub signing_key_path: PathBuf,
    pub token_ttl: Duration,
    // Log full issued tokens at info level.
    pub log_tokens: bool,
    pub accounts_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TokenServerConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    registry_name: Option<String>,
    issuer: Option<String>,
    signing_key_path: Option<PathBuf>,
    token_ttl_secs: Option<u64>,
    log_tokens: Option<bool>,
    accounts_path: Option<PathBuf>,
}

impl TokenServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("WARDEN_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse WARDEN_BIND")?;
        let metrics_bind = std::env::var("WARDEN_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse WARDEN_METRICS_BIND")?;
        let registry_name = std::env::var("WARDEN_REGISTRY_NAME")
            .unwrap_or_else(|_| DEFAULT_REGISTRY_NAME.to_string());
        let issuer =
            std::env::var("WARDEN_TOKEN_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());
        let signing_key_path = std::env::var("WARDEN_SIGNING_KEY")
            .unwrap_or_else(|_| DEFAULT_SIGNING_KEY.to_string())
            .into();
        let token_ttl_secs = std::env::var("WARDEN_TOKEN_TTL_SECS")
            .ok()
            .map(|value| value.parse::<u64>())
            .transpose()
            .with_context(|| "parse WARDEN_TOKEN_TTL_SECS")?
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let log_tokens = std::env::var("WARDEN_LOG_TOKENS")
            .ok()
            .map(|value| parse_bool(&value))
            .transpose()
            .with_context(|| "parse WARDEN_LOG_TOKENS")?
            .unwrap_or(false);
        let accounts_path = std::env::var("WARDEN_ACCOUNTS")
            .unwrap_or_else(|_| DEFAULT_ACCOUNTS.to_string())
            .into();

        let config = Self {
            bind_addr,
            metrics_bind,
            registry_name,
            issuer,
            signing_key_path,
            token_ttl: Duration::from_secs(token_ttl_secs),
            log_tokens,
            accounts_path,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read WARDEN_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: TokenServerConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse token server config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.registry_name {
            self.registry_name = value;
        }
        if let Some(value) = override_cfg.issuer {
            self.issuer = value;
        }
        if let Some(value) = override_cfg.signing_key_path {
            self.signing_key_path = value;
        }
        if let Some(value) = override_cfg.token_ttl_secs {
            self.token_ttl = Duration::from_secs(value);
        }
        if let Some(value) = override_cfg.log_tokens {
            self.log_tokens = value;
        }
        if let Some(value) = override_cfg.accounts_path {
            self.accounts_path = value;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.token_ttl.is_zero() {
            bail!("token ttl must be greater than zero");
        }
        if self.registry_name.trim().is_empty() {
            bail!("registry name must not be empty");
        }
        if self.issuer.trim().is_empty() {
            bail!("token issuer must not be empty");
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("invalid boolean: {other}"),
    }
}
