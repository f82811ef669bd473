// SPDX-License-Identifier: Apache-2.0

//! `X-Signature = HMAC-SHA256(body, webhookSecret)`, hex-encoded.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn sign(secret: &SecretString, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_for_the_same_body_and_secret() {
        let secret = SecretString::from("s3cr3t".to_owned());
        let a = sign(&secret, b"hello");
        let b = sign(&secret, b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let a = sign(&SecretString::from("one".to_owned()), b"hello");
        let b = sign(&SecretString::from("two".to_owned()), b"hello");
        assert_ne!(a, b);
    }
}
