// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::Argon2Params;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    rand_core::RngCore,
};
use argon2::{Algorithm, Argon2, Params, Version};

const GENERATED_PASSWORD_BYTES: usize = 12;
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug)]
pub enum PasswordError {
    TooShort,
    HashError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::TooShort => write!(
                f,
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ),
            PasswordError::HashError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Produces an Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str, params: &Argon2Params) -> Result<String, PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    hash_unchecked(password, params)
}

pub(crate) fn hash_unchecked(password: &str, params: &Argon2Params) -> Result<String, PasswordError> {
    let mut salt_bytes = vec![0u8; params.salt_len as usize];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| PasswordError::HashError(err.to_string()))?;
    let argon2 = build_argon2(params)?;
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| PasswordError::HashError(err.to_string()))?;
    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string. The cost parameters are
/// taken from the stored hash, not from the current config.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| PasswordError::HashError(err.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}

fn build_argon2(params: &Argon2Params) -> Result<Argon2<'static>, PasswordError> {
    let output_len = params.output_len as usize;
    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(output_len),
    )
    .map_err(|err| PasswordError::HashError(err.to_string()))?;
    Ok(Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        argon2_params,
    ))
}

pub fn generate_secret_hex(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A random password for bootstrap accounts, printed once to the operator.
pub fn generate_password() -> String {
    generate_secret_hex(GENERATED_PASSWORD_BYTES)
}
