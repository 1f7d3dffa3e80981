//! Common validation utilities.

use validator::ValidationError;

/// Minimum / maximum in-game name length (Mojang account rules).
const PLAYER_NAME_MIN: usize = 3;
const PLAYER_NAME_MAX: usize = 16;

/// Maximum promo code length.
const PROMO_CODE_MAX: usize = 32;

/// Validates a Minecraft player name.
///
/// Names are restricted to `[A-Za-z0-9_]` and 3..=16 characters. This is
/// also the injection guard for remote command templates: names passing
/// this check are safe to substitute into command strings verbatim.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let len_ok = (PLAYER_NAME_MIN..=PLAYER_NAME_MAX).contains(&name.len());
    let charset_ok = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if len_ok && charset_ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_player_name");
        err.message =
            Some("Player name must be 3-16 characters of letters, digits, or underscore".into());
        Err(err)
    }
}

/// Validates a promo code string (uppercase letters, digits, `_`, `-`).
pub fn validate_promo_code(code: &str) -> Result<(), ValidationError> {
    let len_ok = !code.is_empty() && code.len() <= PROMO_CODE_MAX;
    let charset_ok = code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-');

    if len_ok && charset_ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_promo_code");
        err.message = Some(
            "Promo code must be 1-32 characters of uppercase letters, digits, '_' or '-'".into(),
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_player_names() {
        assert!(validate_player_name("Steve").is_ok());
        assert!(validate_player_name("x_Herobrine_x").is_ok());
        assert!(validate_player_name("abc").is_ok());
        assert!(validate_player_name("A234567890123456").is_ok()); // 16 chars
    }

    #[test]
    fn test_invalid_player_names() {
        assert!(validate_player_name("ab").is_err()); // too short
        assert!(validate_player_name("A2345678901234567").is_err()); // 17 chars
        assert!(validate_player_name("bad name").is_err());
        assert!(validate_player_name("semi;colon").is_err());
        assert!(validate_player_name("slash/run").is_err());
        assert!(validate_player_name("").is_err());
    }

    #[test]
    fn test_player_name_blocks_command_injection() {
        // Anything that could smuggle a second command must be rejected.
        assert!(validate_player_name("Steve\nstop").is_err());
        assert!(validate_player_name("Steve x").is_err());
    }

    #[test]
    fn test_valid_promo_codes() {
        assert!(validate_promo_code("SUMMER-2024").is_ok());
        assert!(validate_promo_code("WELCOME_10").is_ok());
        assert!(validate_promo_code("X").is_ok());
    }

    #[test]
    fn test_invalid_promo_codes() {
        assert!(validate_promo_code("").is_err());
        assert!(validate_promo_code("lowercase").is_err());
        assert!(validate_promo_code(&"A".repeat(33)).is_err());
        assert!(validate_promo_code("WITH SPACE").is_err());
    }
}
