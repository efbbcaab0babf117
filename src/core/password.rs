//! Salted password hashing
//!
//! Stored form: `hmac-sha256$<salt hex>$<digest hex>` where the digest is
//! HMAC-SHA256 keyed by a random 16-byte salt over the password bytes.
//! Verification goes through `Mac::verify_slice`, which compares in constant
//! time.
//!
//! This is a single fast HMAC pass, not a stretched KDF. The scheme name is
//! stored with every hash, so records can be migrated to a slower scheme
//! when one is introduced.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "hmac-sha256";
const SALT_LEN: usize = 16;

/// Well-formed hash that no password verifies against
///
/// Sign-in checks unknown usernames against it so both failure paths run
/// one HMAC verification.
pub const UNKNOWN_ACCOUNT_HASH: &str = concat!(
    "hmac-sha256$",
    "00000000000000000000000000000000",
    "$",
    "0000000000000000000000000000000000000000000000000000000000000000",
);

/// Hash a plaintext password with a fresh random salt
pub fn hash_password<R: RngCore + ?Sized>(password: &str, rng: &mut R) -> String {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let digest = digest(&salt, password);
    format!("{}${}${}", SCHEME, hex::encode(salt), hex::encode(digest))
}

/// Check a plaintext password against a stored hash
///
/// Returns false for any stored value that is not in the expected format.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(salt_hex), Some(digest_hex), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(&salt) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC can take key of any size");
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
