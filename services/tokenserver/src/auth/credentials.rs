//! Request-boundary helpers: Basic credentials and client address.
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Decode `Authorization: Basic base64(user:pass)`.
///
/// Both halves are query-unescaped after splitting on the first `:`. A missing
/// or malformed header yields empty credentials, which then fail login.
pub fn basic_credentials(headers: &HeaderMap) -> BasicCredentials {
    parse_basic(headers).unwrap_or_default()
}

fn parse_basic(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if scheme != "Basic" {
        return None;
    }
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: query_unescape(username),
        password: query_unescape(password),
    })
}

fn query_unescape(value: &str) -> String {
    urlencoding::decode(&value.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .unwrap_or_default()
}

/// Caller address used for IP pattern checks.
///
/// Prefers the first segment of `X-Forwarded-For` (then `X-Real-IP`), cut at
/// the first `,` or `:`, and falls back to the transport peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for name in [FORWARDED_FOR, REAL_IP] {
        if let Some(value) = headers.get(name).and_then(|value| value.to_str().ok()) {
            let first = value.split([',', ':']).next().unwrap_or_default().trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}
