use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query string of `GET /api/auth`.
#[derive(Debug, Clone, Default)]
pub struct TokenQuery {
    pub service: Option<String>,
    pub scope: Option<String>,
}

impl TokenQuery {
    /// Repeated keys keep the last value; unrelated keys such as
    /// `account` or `client_id` are ignored.
    pub fn from_params(mut params: HashMap<String, String>) -> Self {
        Self {
            service: params.remove("service"),
            scope: params.remove("scope"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
