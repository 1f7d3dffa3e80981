//! Hashing and referral-code generation helpers.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of a generated referral code in hex characters.
const REFERRAL_CODE_LEN: usize = 12;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a referral code for a player.
///
/// The code is derived from the player name plus a random nonce, so it is
/// unguessable but stable in length and charset (lowercase hex).
pub fn generate_referral_code(player_name: &str) -> String {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let digest = sha256_hex(&format!("{}:{}", player_name, hex::encode(nonce)));
    digest[..REFERRAL_CODE_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
    }

    #[test]
    fn test_referral_code_length_and_charset() {
        let code = generate_referral_code("Steve");
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_referral_code_unique_per_call() {
        // Same name, different nonce, different code.
        assert_ne!(
            generate_referral_code("Steve"),
            generate_referral_code("Steve")
        );
    }
}
