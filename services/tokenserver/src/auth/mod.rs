mod authorizer;
mod credentials;

pub use authorizer::{AuthError, Authorizer, TokenRequest};
pub use credentials::{BasicCredentials, basic_credentials, client_ip};
