//! Registry token server library crate.
//!
//! # Purpose
//! Exposes the token endpoint, the authorization flow, configuration and the
//! file-backed account store for use by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod observability;
pub mod store;

use anyhow::Context;
use app::AppState;
use auth::Authorizer;
use config::TokenServerConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use store::file::FileAccountStore;
use warden_authz::{KeyManager, TokenIssuer, TokenSettings};

/// Wire the account store, key manager and issuer described by `config`.
///
/// The signing key is not read here; the first token request loads it.
pub fn build_state(config: &TokenServerConfig) -> anyhow::Result<AppState> {
    let accounts = Arc::new(
        FileAccountStore::load(&config.accounts_path).context("load account store")?,
    );
    let keys = Arc::new(KeyManager::new(&config.signing_key_path));
    let issuer = TokenIssuer::new(
        TokenSettings::new(&config.issuer, &config.registry_name).with_ttl(config.token_ttl),
        keys,
    );
    let authorizer = Authorizer::new(
        config.registry_name.clone(),
        accounts.clone(),
        accounts,
        issuer,
    )
    .with_token_logging(config.log_tokens);
    Ok(AppState {
        authorizer: Arc::new(authorizer),
    })
}

pub async fn run_with_shutdown<F>(config: TokenServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability()?;
    let state = build_state(&config)?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = app::build_router(state);
    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        registry = %config.registry_name,
        issuer = %config.issuer,
        "token server listening"
    );
    if config.log_tokens {
        tracing::warn!("token logging enabled; issued tokens will appear in logs");
    }
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}
