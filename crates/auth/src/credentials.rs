//! Password hashing and verification (Argon2id, PHC strings).

use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use argon2::{Algorithm, Argon2, Params, Version};

use tollgate_core::DomainError;

use crate::account::PasswordHash;
use crate::error::InternalError;

/// Password hashing with a tunable work factor.
///
/// Verification reads the parameters embedded in the stored hash, so raising
/// the work factor does not invalidate existing hashes.
#[derive(Clone)]
pub struct CredentialStore {
    hasher: Argon2<'static>,
    /// Hash of a random throwaway password, verified against on the
    /// unknown-identity login path.
    dummy: PasswordHash,
}

impl CredentialStore {
    /// `work_factor` is the Argon2 time cost (passes); `memory_kib` the memory cost.
    pub fn new(work_factor: u32, memory_kib: u32) -> Result<Self, InternalError> {
        let params = Params::new(memory_kib, work_factor, Params::DEFAULT_P_COST, None)
            .map_err(|e| InternalError::new(format!("invalid password hashing parameters: {e}")))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let throwaway = SaltString::generate(&mut OsRng);
        let dummy = hash_with(&hasher, throwaway.as_str())?;

        Ok(Self { hasher, dummy })
    }

    pub fn hash(&self, plaintext: &str) -> Result<PasswordHash, InternalError> {
        hash_with(&self.hasher, plaintext)
    }

    /// `false` on mismatch or on an unparsable stored hash; never errors.
    pub fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        let parsed = match PhcHash::new(hash.as_phc()) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.hasher
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Run one verification against the throwaway hash and report failure.
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.dummy);
        false
    }
}

impl core::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

fn hash_with(hasher: &Argon2<'static>, plaintext: &str) -> Result<PasswordHash, InternalError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = hasher
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| InternalError::new(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(PasswordHash::from_phc(phc))
}

/// Minimum password policy applied before hashing.
pub fn validate_password(plaintext: &str, min_length: usize) -> Result<(), DomainError> {
    if plaintext.trim().is_empty() {
        return Err(DomainError::validation("password cannot be empty"));
    }
    if plaintext.chars().count() < min_length {
        return Err(DomainError::validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn cheap_credentials() -> CredentialStore {
    CredentialStore::new(1, Params::MIN_M_COST).expect("valid test params")
}
