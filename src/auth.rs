//! Password hashing and session tokens.
//!
//! Passwords are stored as `<hex key>.<hex salt>` where the key is PBKDF2-HMAC-SHA256 of the
//! password and a random 16 byte salt.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

#[cfg(not(test))]
const PBKDF2_ITERATIONS: u32 = 200_000;
// Debug builds of sha2 are slow and the tests hash many passwords.
#[cfg(test)]
const PBKDF2_ITERATIONS: u32 = 1_000;

const KEY_LEN: usize = 32;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = random_bytes();
    let key = derive_key(password, &salt);
    format!("{}.{}", hex::encode(key), hex::encode(salt))
}

/// Returns true when `password` matches a hash produced by [`hash_password`]. A malformed hash
/// never matches.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((key_hex, salt_hex)) = stored.split_once('.') else {
        return false;
    };
    let (Ok(expected), Ok(salt)) = (hex::decode(key_hex), hex::decode(salt_hex)) else {
        return false;
    };
    if expected.len() != KEY_LEN {
        return false;
    }
    derive_key(password, &salt)[..].ct_eq(&expected[..]).into()
}

/// Creates an opaque random session token.
pub fn new_session_token() -> String {
    hex::encode(random_bytes::<TOKEN_LEN>())
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}
