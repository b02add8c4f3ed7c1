use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::types::token::TokenType;

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

pub fn new_token(kind: TokenType) -> String {
    let mut buf = [0u8; 32];
    let mut rng = OsRng;
    rng.fill_bytes(&mut buf);
    format!("{kind}_{}", URL_SAFE_NO_PAD.encode(buf))
}

/// Argon2 PHC string for a token or password.
pub fn encrypt(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let mut rng = OsRng;
    let salt = SaltString::generate(&mut rng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default().verify_password(secret.as_bytes(), &parsed).is_ok())
}

fn keyed(key: &str) -> Result<Argon2<'_>, argon2::password_hash::Error> {
    Ok(Argon2::new_with_secret(key.as_bytes(), Algorithm::Argon2id, Version::V0x13, Params::default())?)
}

/// Like [`encrypt`], but the hash only verifies under the same `key`.
pub fn encrypt_keyed(secret: &str, key: &str) -> Result<String, argon2::password_hash::Error> {
    let mut rng = OsRng;
    let salt = SaltString::generate(&mut rng);
    let hash = keyed(key)?.hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_keyed(secret: &str, hash: &str, key: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(keyed(key)?.verify_password(secret.as_bytes(), &parsed).is_ok())
}

/// Client-facing token: `base64url("{id}.{secret}")`.
pub fn construct_token(id: &Uuid, secret: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("{id}.{secret}"))
}

pub fn extract_token_parts(token: &str) -> Option<(Uuid, String)> {
    let decoded = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once('.')?;
    if secret.is_empty() {
        return None;
    }
    Some((Uuid::parse_str(id).ok()?, secret.to_string()))
}

pub fn encode_uid(id: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(uidb64: &str) -> Option<Uuid> {
    let raw = URL_SAFE_NO_PAD.decode(uidb64).ok()?;
    Uuid::parse_str(std::str::from_utf8(&raw).ok()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_hash_needs_the_same_key() {
        let hash = encrypt_keyed("reset-secret", "key-one").unwrap();
        assert!(verify_keyed("reset-secret", &hash, "key-one").unwrap());
        assert!(!verify_keyed("reset-secret", &hash, "key-two").unwrap());
        assert!(!verify_keyed("other-secret", &hash, "key-one").unwrap());
    }
}
