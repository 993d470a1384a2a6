//! License key generation.
//!
//! Keys are sixteen characters drawn uniformly from `A-Z0-9`. The generator
//! does not check for collisions with stored keys; see
//! [`LicenseManager::issue_license`](crate::LicenseManager::issue_license)
//! for the variant that does.

use rand::Rng;
use sypher_types::{LicenseKey, KEY_ALPHABET, KEY_LENGTH};

/// Generates a random license key using the thread-local RNG.
#[must_use]
pub fn generate_license_key() -> LicenseKey {
    generate_license_key_with(&mut rand::thread_rng())
}

/// Generates a random license key from the given RNG.
#[must_use]
pub fn generate_license_key_with<R: Rng + ?Sized>(rng: &mut R) -> LicenseKey {
    let key: String = (0..KEY_LENGTH)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    LicenseKey::from_generated(key)
}
