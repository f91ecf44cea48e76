use crate::ActionSet;

/// A parsed `type:name:actions` scope from a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRequest {
    pub resource_type: String,
    pub resource_name: String,
    pub actions: ActionSet,
}

impl ScopeRequest {
    pub fn new(
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        actions: ActionSet,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            actions,
        }
    }

    /// Parse a wire scope string.
    ///
    /// Accepts `type:name:actions` and `type:host:port/path:actions`; the
    /// latter rejoins the two middle fields with `:` so registry-qualified
    /// names survive. Any other field count, or an empty type or name,
    /// returns `None`. Unknown action tokens are dropped.
    pub fn parse(scope: &str) -> Option<Self> {
        let parts: Vec<&str> = scope.split(':').collect();
        let (resource_type, resource_name, actions) = match parts.as_slice() {
            [kind, name, actions] => (*kind, (*name).to_string(), *actions),
            [kind, host, path, actions] => (*kind, format!("{host}:{path}"), *actions),
            _ => return None,
        };
        if resource_type.is_empty() || resource_name.is_empty() {
            return None;
        }

        Some(Self {
            resource_type: resource_type.to_string(),
            resource_name,
            actions: ActionSet::from_tokens(actions.split(',')),
        })
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_fields() {
        let scope = ScopeRequest::parse("repository:alpine:pull").expect("scope");
        assert_eq!(scope.resource_type, "repository");
        assert_eq!(scope.resource_name, "alpine");
        assert_eq!(scope.actions.to_vec(), vec!["pull"]);
    }

    #[test]
    fn parse_rejoins_registry_host() {
        let scope =
            ScopeRequest::parse("repository:example.com:5000/test/image:pull,push").expect("scope");
        assert_eq!(scope.resource_name, "example.com:5000/test/image");
        assert_eq!(scope.actions.to_vec(), vec!["pull", "push"]);
    }

    #[test]
    fn parse_rejects_wrong_field_counts() {
        assert!(ScopeRequest::parse("").is_none());
        assert!(ScopeRequest::parse("repository").is_none());
        assert!(ScopeRequest::parse("repository:pull,push").is_none());
        assert!(ScopeRequest::parse("a:b:c:d:pull").is_none());
    }

    #[test]
    fn parse_rejects_empty_type_or_name() {
        assert!(ScopeRequest::parse(":alpine:pull").is_none());
        assert!(ScopeRequest::parse("repository::pull").is_none());
    }

    #[test]
    fn parse_drops_unknown_actions() {
        let scope = ScopeRequest::parse("repository:alpine:pull,fly,*").expect("scope");
        assert_eq!(scope.actions.to_vec(), vec!["pull", "*"]);
    }

    #[test]
    fn parse_allows_empty_actions() {
        let scope = ScopeRequest::parse("registry:catalog:").expect("scope");
        assert!(!scope.has_actions());

        let scope = ScopeRequest::parse("repository:alpine:bogus").expect("scope");
        assert!(!scope.has_actions());
    }
}
