use uuid::Uuid;

/// Random version 4 UUID in hyphenated lowercase form, used as the `jti` claim.
pub fn generate_token_id() -> String {
    Uuid::new_v4().to_string()
}
