//! Secure random password generator

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

/// Characters a generated password is drawn from
pub const CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+~`|}{[]:;?><,./-=";

/// Length used when the caller does not ask for one
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// Generate a password of `length` characters using the OS RNG
pub fn generate_password(length: usize) -> String {
    generate_password_with(&mut OsRng, length)
}

/// Generate a password of `length` characters from the given RNG
///
/// Every character is an independent uniform draw from `CHARSET`, with
/// replacement. The RNG must be cryptographically secure.
pub fn generate_password_with<R: RngCore + CryptoRng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_generate_default_length() {
        let password = generate_password(DEFAULT_PASSWORD_LENGTH);
        assert_eq!(password.chars().count(), 16);
    }

    #[test]
    fn test_generate_custom_lengths() {
        for length in [0, 1, 8, 32, 128] {
            assert_eq!(generate_password(length).chars().count(), length);
        }
    }

    #[test]
    fn test_only_charset_characters() {
        let password = generate_password(512);
        assert!(password.bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn test_charset_has_no_duplicates() {
        let unique: HashSet<u8> = CHARSET.iter().copied().collect();
        assert_eq!(unique.len(), CHARSET.len());
    }

    #[test]
    fn test_charset_spans_all_classes() {
        assert!(CHARSET.iter().any(u8::is_ascii_lowercase));
        assert!(CHARSET.iter().any(u8::is_ascii_uppercase));
        assert!(CHARSET.iter().any(u8::is_ascii_digit));
        assert!(CHARSET.iter().any(u8::is_ascii_punctuation));
    }

    #[test]
    fn test_passwords_are_unique() {
        let p1 = generate_password(16);
        let p2 = generate_password(16);
        assert_ne!(p1, p2);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(
            generate_password_with(&mut a, 24),
            generate_password_with(&mut b, 24)
        );
    }

    #[test]
    fn test_draws_cover_charset() {
        let password = generate_password(20_000);
        let seen: HashSet<u8> = password.bytes().collect();
        assert_eq!(seen.len(), CHARSET.len());
    }
}
