//! Password policy and hashing.

use crate::error::AppError;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const ALGORITHM: &str = "sha256";
const ITERATIONS: u32 = 10_000;
const MIN_LENGTH: usize = 8;

/// Reject passwords that are too short, entirely numeric, or equal to the
/// username / e-mail local part.
pub fn validate_password(password: &str, username: &str, email: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must contain at least {} characters",
            MIN_LENGTH
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("password is entirely numeric".into()));
    }
    let lowered = password.to_lowercase();
    let local_part = email.split('@').next().unwrap_or_default().to_lowercase();
    if lowered == username.to_lowercase() || (!local_part.is_empty() && lowered == local_part) {
        return Err(AppError::Validation(
            "password is too similar to the username or email".into(),
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = derive(password, &salt, ITERATIONS);
    format!("{}${}${}${}", ALGORITHM, ITERATIONS, salt, digest)
}

pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let actual = derive(password, salt, iterations);
    // compare every byte so timing does not leak the matching prefix length
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn derive(password: &str, salt: &str, iterations: u32) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..iterations {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(password.as_bytes())
            .finalize();
    }
    format!("{:x}", digest)
}
