use axum::body::Body;
use axum::http::Request;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tokenserver::app::{AppState, build_router};
use tokenserver::auth::Authorizer;
use tokenserver::store::file::FileAccountStore;
use warden_authz::{KeyManager, KeyMaterial, RegistryClaims, TokenIssuer, TokenSettings};

pub const REGISTRY: &str = "registry.local";
pub const ISSUER: &str = "warden";
pub const PRIVATE_KEY: &str = include_str!("../../../../crates/warden-authz/testdata/rsa_pkcs1.pem");
pub const PUBLIC_KEY: &str = include_str!("../../../../crates/warden-authz/testdata/rsa_public.pem");
pub const KEY_ID: &str = "C2ES:RYYV:FUDF:H4AL:APLJ:VTOQ:JZUX:DFM6:H6NH:V2DG:ZFQW:2QST";

const ACCOUNTS: &str = r#"
users:
  - username: alice
    password: wonderland
    hash: none
    permissions:
      - ip: "**"
        repository: "alice/*"
        access: [pull, push]
      - ip: "**"
        repository: "library/**"
        access: [pull]
  - username: carol
    password: "p@ss word"
    hash: none
    permissions:
      - ip: "10.0.0.*"
        repository: "**"
        access: [pull, push, delete]
  - username: dave
    password: nopermissions
    hash: none
"#;

pub fn app() -> axum::Router {
    let material = KeyMaterial::from_pem(PRIVATE_KEY.as_bytes()).expect("parse key");
    app_with_keys(KeyManager::with_material(material))
}

pub fn app_with_keys(keys: KeyManager) -> axum::Router {
    let accounts = Arc::new(FileAccountStore::from_yaml(ACCOUNTS).expect("accounts"));
    let issuer = TokenIssuer::new(TokenSettings::new(ISSUER, REGISTRY), Arc::new(keys));
    let authorizer = Authorizer::new(REGISTRY, accounts.clone(), accounts, issuer);
    build_router(AppState {
        authorizer: Arc::new(authorizer),
    })
}

pub fn token_request(query: &str, credentials: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(format!("/api/auth{query}"))
        .header("x-forwarded-for", "10.0.0.5");
    if let Some(raw) = credentials {
        builder = builder.header(
            "authorization",
            format!("Basic {}", STANDARD.encode(raw)),
        );
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn verify_token(token: &str) -> RegistryClaims {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).expect("public key");
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[REGISTRY]);
    validation.set_issuer(&[ISSUER]);
    let header = jsonwebtoken::decode_header(token).expect("header");
    assert_eq!(header.kid.as_deref(), Some(KEY_ID));
    jsonwebtoken::decode::<RegistryClaims>(token, &key, &validation)
        .expect("verify token")
        .claims
}
