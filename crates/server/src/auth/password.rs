use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordVerifier};

/// Verify a candidate password against an argon2 hash string.
///
/// Returns `true` if the password matches. A malformed hash never matches.
pub fn verify_password(hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

/// Whether `hash` parses as a PHC password hash string.
pub fn is_valid_hash(hash: &str) -> bool {
    PasswordHash::new(hash).is_ok()
}

#[cfg(test)]
pub(crate) fn hash_for_tests(password: &str) -> String {
    use argon2::password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::encode_b64(b"cairn-test-salt!").unwrap();
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_verifies() {
        let hash = hash_for_tests("correct horse");
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "battery staple"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!is_valid_hash("not-a-hash"));
        assert!(!verify_password("not-a-hash", "anything"));
    }
}
