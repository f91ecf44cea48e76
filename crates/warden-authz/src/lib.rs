//! Authorization primitives for registry bearer-token issuance.
//!
//! # Purpose
//! Turns a requested scope plus a user's configured access control entries
//! into the minimal set of granted actions, and signs that grant into an RS256
//! bearer token a container registry can verify.
//!
//! # How it fits
//! The token server authenticates callers and fetches their entries from a
//! credential store, then calls [`ScopeRequest::parse`], [`evaluate`] and
//! [`TokenIssuer::issue`] from this crate. Registries verify the resulting
//! token against the public key identified by the header `kid`.
//!
//! # Key invariants
//! - A grant never exceeds the requested actions.
//! - No entries, or one entry with a non-matching IP pattern, grants nothing.
//! - `*` is an ordinary action when intersecting; it never implies the others.
//! - Token `kid` values are stable for a given key (see [`fingerprint`]).
//!
//! # Examples
//! ```rust
//! use warden_authz::{AccessControlEntry, ActionSet, ScopeRequest, evaluate};
//!
//! let scope = ScopeRequest::parse("repository:team/app:pull,push").unwrap();
//! let entries = vec![AccessControlEntry::new(
//!     "**",
//!     "team/*",
//!     ActionSet::from_tokens(["pull"]),
//! )];
//! let decision = evaluate("10.0.0.7", &scope, &entries);
//! assert_eq!(decision.actions.to_vec(), vec!["pull"]);
//! ```
//!
//! # Common pitfalls
//! - Unknown action names are dropped silently, so a typo in an accounts file
//!   shows up as a missing grant rather than a load error.
//! - The audience claim is the registry service name; it must match the
//!   registry's configured `service`.

mod acl;
mod action;
mod errors;
mod glob;
mod jti;
mod keys;
mod scope;
mod token;

pub use acl::{AccessControlEntry, AuthorizationDecision, evaluate};
pub use action::{Action, ActionSet};
pub use errors::{AuthzError, AuthzResult};
pub use glob::{GlobPattern, glob_match};
pub use jti::generate_token_id;
pub use keys::{KeyManager, KeyMaterial, fingerprint};
pub use scope::ScopeRequest;
pub use token::{
    DEFAULT_TOKEN_TTL, IssuedToken, NOT_BEFORE_SKEW, RegistryClaims, TokenIssuer, TokenSettings,
};
