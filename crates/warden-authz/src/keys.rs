//! Signing key loading and key ID derivation.
//!
//! # Overview
//! [`KeyManager`] owns the path to a PEM encoded RSA private key and parses it
//! lazily on first use. The parsed [`KeyMaterial`] (private key, JWT encoding
//! key and fingerprint) is cached for the life of the manager and shared with
//! callers through an `Arc`.
//!
//! # Key formats
//! The first PEM block in the file is decoded as PKCS#1 (`RSA PRIVATE KEY`)
//! and then as PKCS#8 (`PRIVATE KEY`). A well-formed PKCS#8 key for any other
//! algorithm fails with [`AuthzError::NotRsaKey`].
//!
//! # Fingerprint
//! The key ID placed in token headers is derived from the DER encoded
//! SubjectPublicKeyInfo: SHA-256, truncated to 30 bytes, base32 without
//! padding, split into `:`-separated groups of four characters. Registries
//! compute the same value from the published certificate, so the format must
//! not change.
//!
//! # Concurrency
//! The cache is a `RwLock<Option<..>>`. Readers take the shared lock; the first
//! writer re-checks the slot before parsing, so concurrent first callers parse
//! the file once. Load failures are not cached.
use crate::{AuthzError, AuthzResult};
use data_encoding::BASE32_NOPAD;
use jsonwebtoken::EncodingKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, PrivateKeyInfo};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

const FINGERPRINT_BYTES: usize = 30;
const FINGERPRINT_GROUP: usize = 4;

pub struct KeyMaterial {
    private_key: RsaPrivateKey,
    encoding_key: EncodingKey,
    fingerprint: String,
}

impl KeyMaterial {
    /// Parse key material from PEM bytes.
    ///
    /// # Errors
    /// - `KeyLoad` when no PEM block is present or the DER is not a private key.
    /// - `NotRsaKey` when the PKCS#8 container holds a non-RSA key.
    pub fn from_pem(pem_bytes: &[u8]) -> AuthzResult<Self> {
        let block = pem::parse(pem_bytes)
            .map_err(|err| AuthzError::KeyLoad(format!("key must be PEM encoded: {err}")))?;
        let private_key = decode_private_key(block.contents())?;
        Self::from_private_key(private_key)
    }

    pub fn from_private_key(private_key: RsaPrivateKey) -> AuthzResult<Self> {
        let fingerprint = fingerprint(&private_key.to_public_key())?;
        let pkcs1 = private_key
            .to_pkcs1_der()
            .map_err(|err| AuthzError::KeyLoad(format!("encode private key: {err}")))?;
        let encoding_key = EncodingKey::from_rsa_der(pkcs1.as_bytes());
        Ok(Self {
            private_key,
            encoding_key,
            fingerprint,
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

fn decode_private_key(der: &[u8]) -> AuthzResult<RsaPrivateKey> {
    if let Ok(key) = RsaPrivateKey::from_pkcs1_der(der) {
        return Ok(key);
    }
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|err| AuthzError::KeyLoad(format!("not a PKCS#1 or PKCS#8 key: {err}")))?;
    if info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(AuthzError::NotRsaKey);
    }
    RsaPrivateKey::from_pkcs8_der(der)
        .map_err(|err| AuthzError::KeyLoad(format!("decode PKCS#8 RSA key: {err}")))
}

/// Key ID for `public_key` in `XXXX:XXXX:...` form (twelve groups).
pub fn fingerprint(public_key: &RsaPublicKey) -> AuthzResult<String> {
    let der = public_key
        .to_public_key_der()
        .map_err(|err| AuthzError::KeyLoad(format!("encode public key: {err}")))?;
    let digest = Sha256::digest(der.as_bytes());
    let encoded = BASE32_NOPAD.encode(&digest[..FINGERPRINT_BYTES]);
    Ok(group_fingerprint(&encoded))
}

fn group_fingerprint(encoded: &str) -> String {
    let chars: Vec<char> = encoded.chars().collect();
    chars
        .chunks(FINGERPRINT_GROUP)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}

/// Lazily loaded signing key backed by a PEM file.
#[derive(Debug)]
pub struct KeyManager {
    path: PathBuf,
    cached: RwLock<Option<Arc<KeyMaterial>>>,
}

impl KeyManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: RwLock::new(None),
        }
    }

    /// Manager that never touches the filesystem.
    pub fn with_material(material: KeyMaterial) -> Self {
        Self {
            path: PathBuf::new(),
            cached: RwLock::new(Some(Arc::new(material))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Return the cached key, reading and parsing the file on first use.
    ///
    /// # Errors
    /// `KeyLoad` or `NotRsaKey`; a failed load is retried on the next call.
    pub fn signing_key(&self) -> AuthzResult<Arc<KeyMaterial>> {
        {
            let cached = self.cached.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(found) = cached.as_ref() {
                return Ok(Arc::clone(found));
            }
        }

        let mut slot = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have filled the slot while we waited.
        if let Some(found) = slot.as_ref() {
            return Ok(Arc::clone(found));
        }
        let material = Arc::new(self.load()?);
        *slot = Some(Arc::clone(&material));
        Ok(material)
    }

    pub fn fingerprint(&self) -> AuthzResult<String> {
        Ok(self.signing_key()?.fingerprint().to_string())
    }

    fn load(&self) -> AuthzResult<KeyMaterial> {
        let bytes = std::fs::read(&self.path).map_err(|err| {
            AuthzError::KeyLoad(format!("read {}: {err}", self.path.display()))
        })?;
        KeyMaterial::from_pem(&bytes)
    }
}
