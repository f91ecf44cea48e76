//! Token endpoint handler.
//!
//! # Purpose
//! Extracts Basic credentials, the caller address and the `service`/`scope`
//! query parameters, then delegates to the [`Authorizer`](crate::auth::Authorizer).
use crate::api::error::ApiError;
use crate::api::types::{TokenQuery, TokenResponse};
use crate::app::AppState;
use crate::auth::{TokenRequest, basic_credentials, client_ip};
use crate::observability::record_token_request;
use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::net::SocketAddr;

pub async fn issue_token(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let query = TokenQuery::from_params(params);
    let credentials = basic_credentials(&headers);
    let request = TokenRequest {
        username: credentials.username,
        password: credentials.password,
        service: query.service,
        scope: query.scope,
        client_ip: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
    };

    match state.authorizer.authorize(&request).await {
        Ok(issued) => {
            record_token_request("issued");
            Ok(Json(TokenResponse {
                token: issued.token,
                expires_in: issued.expires_in,
            }))
        }
        Err(err) => {
            record_token_request(err.outcome());
            Err(err.into())
        }
    }
}
