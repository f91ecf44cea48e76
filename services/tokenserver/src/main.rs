//! Registry token server entry point.
//!
//! # Notes
//! Configuration comes from `WARDEN_*` environment variables, optionally
//! overridden by the YAML file named in `WARDEN_CONFIG`.
use tokenserver::config::TokenServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TokenServerConfig::from_env_or_yaml()?;
    tokenserver::run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
