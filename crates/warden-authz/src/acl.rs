use crate::glob::glob_match;
use crate::{ActionSet, ScopeRequest};
use serde::{Deserialize, Serialize};

/// One configured rule: callers from `ip` may perform `actions` on
/// repositories matching `repository`. Both patterns use glob syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub ip: String,
    pub repository: String,
    #[serde(rename = "access", default)]
    pub actions: ActionSet,
}

impl AccessControlEntry {
    pub fn new(ip: impl Into<String>, repository: impl Into<String>, actions: ActionSet) -> Self {
        Self {
            ip: ip.into(),
            repository: repository.into(),
            actions,
        }
    }
}

/// Granted access for one resource. Serializes as a registry access claim:
/// `{"type": ..., "name": ..., "actions": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(rename = "name")]
    pub resource_name: String,
    pub actions: ActionSet,
}

impl AuthorizationDecision {
    /// Decision granting nothing on the requested resource.
    pub fn deny(request: &ScopeRequest) -> Self {
        Self::grant(request, ActionSet::new())
    }

    /// Decision mirroring the request; used when no actions were requested.
    pub fn echo(request: &ScopeRequest) -> Self {
        Self::grant(request, request.actions)
    }

    fn grant(request: &ScopeRequest, actions: ActionSet) -> Self {
        Self {
            resource_type: request.resource_type.clone(),
            resource_name: request.resource_name.clone(),
            actions,
        }
    }
}

/// Compute the actions `client_ip` may perform on the requested resource.
///
/// Entries are first filtered by repository pattern. Every remaining entry
/// must also accept the client address: a single mismatch denies the whole
/// request rather than just dropping that entry. The surviving entries'
/// actions are unioned and intersected with the requested actions.
pub fn evaluate(
    client_ip: &str,
    request: &ScopeRequest,
    entries: &[AccessControlEntry],
) -> AuthorizationDecision {
    if entries.is_empty() {
        return AuthorizationDecision::deny(request);
    }

    let matching: Vec<&AccessControlEntry> = entries
        .iter()
        .filter(|entry| glob_match(&entry.repository, &request.resource_name))
        .collect();

    if matching
        .iter()
        .any(|entry| !glob_match(&entry.ip, client_ip))
    {
        return AuthorizationDecision::deny(request);
    }

    let allowed = matching
        .iter()
        .fold(ActionSet::new(), |acc, entry| acc.union(&entry.actions));
    AuthorizationDecision::grant(request, allowed.intersect(&request.actions))
}
