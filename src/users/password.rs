use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, seq::SliceRandom, Rng};
use tracing::error;

pub const PASSWORD_LENGTH: usize = 12;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Argon2id work factor: 19 MiB of memory, 2 passes, 1 lane.
pub const ARGON2_MEMORY_KIB: u32 = 19_456;
pub const ARGON2_ITERATIONS: u32 = 2;
pub const ARGON2_PARALLELISM: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("hashing failed: {0}")]
    HashingFailed(String),
    #[error("malformed password hash: {0}")]
    MalformedHash(String),
}

/// A freshly generated password and its digest.
#[derive(Clone)]
pub struct Credential {
    pub plain: String,
    pub hash: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("plain", &"<redacted>")
            .field("hash", &self.hash)
            .finish()
    }
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        None,
    )
    .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Draws a 12 character password from the OS CSPRNG with at least one
/// upper-case letter, one lower-case letter and one digit.
pub fn generate_plaintext() -> String {
    let mut rng = OsRng;
    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LENGTH);
    for class in [UPPER, LOWER, DIGITS] {
        chars.push(class[rng.gen_range(0..class.len())]);
    }
    let all: Vec<u8> = [UPPER, LOWER, DIGITS].concat();
    while chars.len() < PASSWORD_LENGTH {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::HashingFailed(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        PasswordError::MalformedHash(e.to_string())
    })?;
    Ok(hasher()?
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Produces a new (plaintext, hash) pair.
pub fn generate_credential() -> Result<Credential, PasswordError> {
    let plain = generate_plaintext();
    let hash = hash_password(&plain)?;
    Ok(Credential { plain, hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_has_expected_shape() {
        for _ in 0..200 {
            let p = generate_plaintext();
            assert_eq!(p.len(), PASSWORD_LENGTH);
            assert!(p.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(p.chars().any(|c| c.is_ascii_uppercase()));
            assert!(p.chars().any(|c| c.is_ascii_lowercase()));
            assert!(p.chars().any(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn plaintexts_do_not_repeat() {
        let a = generate_plaintext();
        let b = generate_plaintext();
        assert_ne!(a, b);
    }

    #[test]
    fn credential_verifies_and_hides_plaintext() {
        let cred = generate_credential().expect("credential");
        assert!(verify_password(&cred.plain, &cred.hash).expect("verify should succeed"));
        assert_ne!(cred.plain, cred.hash);
        assert!(!cred.hash.contains(&cred.plain));
        assert!(cred.hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correctHorse42").expect("hashing should succeed");
        assert!(!verify_password("wrongHorse42", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedHash(_)));
    }

    #[test]
    fn debug_output_redacts_plaintext() {
        let cred = Credential {
            plain: "Abcdef123456".into(),
            hash: "$argon2id$fake".into(),
        };
        assert!(!format!("{cred:?}").contains("Abcdef123456"));
    }
}
