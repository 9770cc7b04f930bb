// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use rand_core::OsRng;

use crate::db::models::{NewTeam, TeamPatch};
use crate::error::{Entity, StoreError, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a plain-text team password into the opaque PHC string kept in
/// `team.password`.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            Entity::Team,
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        )
        .into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Credential(e.to_string()))?;
    Ok(hash.to_string())
}

impl NewTeam {
    pub fn with_password(
        name: impl Into<String>,
        email: impl Into<String>,
        password: &str,
    ) -> Result<Self, StoreError> {
        Ok(NewTeam {
            name: name.into(),
            email: email.into(),
            password: hash_password(password)?,
            ..Default::default()
        })
    }
}

impl TeamPatch {
    /// A patch that only replaces the team's password with a fresh hash.
    pub fn with_password(password: &str) -> Result<Self, StoreError> {
        Ok(TeamPatch {
            password: Some(hash_password(password)?),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn test_hash_is_verifiable() {
        let hash = hash_password("correct horse").expect("Failed to hash password");
        assert!(hash.starts_with("$argon2"));
        let parsed = PasswordHash::new(&hash).expect("Failed to parse hash");
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong horse", &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_short_password_is_rejected() {
        let err = hash_password("short").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_new_team_with_password() {
        let team = NewTeam::with_password("Alice", "a@x.com", "hunter2hunter2")
            .expect("Failed to build team");
        assert_eq!(team.name, "Alice");
        assert_ne!(team.password, "hunter2hunter2");
        assert!(!team.active);
    }

    #[test]
    fn test_team_patch_with_password_stores_a_hash() {
        let patch = TeamPatch::with_password("new password 1").expect("Failed to build patch");
        let hash = patch.password.expect("patch should carry a password");
        assert_ne!(hash, "new password 1");
        let parsed = PasswordHash::new(&hash).expect("Failed to parse hash");
        assert!(
            Argon2::default()
                .verify_password(b"new password 1", &parsed)
                .is_ok()
        );
        assert!(patch.name.is_none());

        assert!(TeamPatch::with_password("short").unwrap_err().is_validation());
    }
}
