// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use vax_domain::DomainError;

use crate::error::{ApiError, translate_domain_error};

/// Generates a six-digit verification code for a new booking.
///
/// The plaintext is returned to the caller exactly once; only the bcrypt
/// hash is stored with the appointment.
#[must_use]
pub fn generate_verification_code() -> String {
    let value = rand::random::<u32>() % 1_000_000;
    format!("{value:06}")
}

/// Hashes a verification code for storage with the appointment.
///
/// # Errors
///
/// Returns `Internal` if bcrypt fails, which indicates a broken
/// environment rather than bad input.
pub fn hash_verification_code(code: &str) -> Result<String, ApiError> {
    bcrypt::hash(code, bcrypt::DEFAULT_COST).map_err(|err| ApiError::Internal {
        message: format!("failed to hash verification code: {err}"),
    })
}

/// Verifies a presented code against the stored hash.
///
/// # Errors
///
/// Returns the verification-code rule violation when the code does not
/// match, or `Internal` if the stored hash is malformed.
pub fn verify_verification_code(code: &str, hash: &str) -> Result<(), ApiError> {
    let matches = bcrypt::verify(code, hash).map_err(|err| ApiError::Internal {
        message: format!("failed to verify verification code: {err}"),
    })?;
    if matches {
        Ok(())
    } else {
        Err(translate_domain_error(DomainError::InvalidVerificationCode))
    }
}
