//! Shared utility functions

/// Minimum length for any password set through the API
pub const MIN_PASSWORD_LEN: usize = 8;

const TEMP_PASSWORD_LEN: usize = 12;

/// Random alphanumeric password handed to new owners and on admin resets
pub fn generate_temp_password() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Normalize an email address for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
