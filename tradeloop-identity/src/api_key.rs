// SPDX-License-Identifier: Apache-2.0

//! API keys are random 32+-byte secrets; only a salted hash is ever stored (§3).
//! Verification is constant-time to avoid timing side channels on the comparison.

use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

const KEY_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

/// A freshly generated plaintext API key. Returned to the caller exactly once
/// (§6, `POST /admin/tenants`); never persisted in this form.
pub struct ApiKeySecret(SecretString);

impl ApiKeySecret {
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(SecretString::from(hex::encode(bytes)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn hash(&self) -> StoredApiKeyHash {
        StoredApiKeyHash::new(self.expose())
    }

    pub fn into_secret_string(self) -> SecretString {
        self.0
    }
}

/// The salted hash actually persisted for a tenant. `Tenant`'s API key is
/// regenerable; regenerating replaces this value atomically (the old hash simply
/// stops being the one compared against).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredApiKeyHash {
    salt: [u8; SALT_BYTES],
    hash: [u8; 32],
}

impl StoredApiKeyHash {
    pub fn new(plaintext: &str) -> Self {
        let mut salt = [0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);
        let hash = Self::digest(&salt, plaintext);
        Self { salt, hash }
    }

    /// Constant-time comparison of `candidate` against the stored hash, per
    /// §4.7 ("API keys are validated by constant-time comparison of a salted
    /// hash").
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate_hash = Self::digest(&self.salt, candidate);
        candidate_hash.ct_eq(&self.hash).into()
    }

    fn digest(salt: &[u8; SALT_BYTES], plaintext: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(plaintext.as_bytes());
        hasher.finalize().into()
    }
}

#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error("missing or invalid API key")]
    Unauthorized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_verifies_against_its_own_hash() {
        let key = ApiKeySecret::generate();
        let stored = key.hash();
        assert!(stored.verify(key.expose()));
    }

    #[test]
    fn wrong_key_does_not_verify() {
        let key = ApiKeySecret::generate();
        let stored = key.hash();
        assert!(!stored.verify("not-the-key"));
    }

    #[test]
    fn two_generated_keys_differ() {
        let a = ApiKeySecret::generate();
        let b = ApiKeySecret::generate();
        assert_ne!(a.expose(), b.expose());
    }

    #[test]
    fn regenerating_retires_the_old_hash_atomically() {
        let old = ApiKeySecret::generate();
        let old_hash = old.hash();
        let new = ApiKeySecret::generate();
        let new_hash = new.hash();

        assert!(old_hash.verify(old.expose()));
        assert!(!new_hash.verify(old.expose()));
        assert!(new_hash.verify(new.expose()));
    }
}
