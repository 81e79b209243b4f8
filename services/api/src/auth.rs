//! Password hashing and the permission predicate

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

use crate::models::Permission;

/// Hash a plaintext password with argon2 and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

/// Verify a plaintext password against a stored PHC string
///
/// The comparison inside argon2 is constant-time; a malformed stored hash
/// is an error rather than a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("failed to parse password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Whether a permission set satisfies a required permission
///
/// True iff the set holds `FullAccess` or the required permission itself.
/// All-or-nothing per operation category; there is no field-level
/// granularity.
pub fn has_permission(permissions: &[Permission], required: Permission) -> bool {
    permissions.contains(&Permission::FullAccess) || permissions.contains(&required)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Permission; 7] = [
        Permission::FullAccess,
        Permission::ManagePositions,
        Permission::ViewEmployeeData,
        Permission::ManageEmployees,
        Permission::ManageDepartments,
        Permission::PrintDocuments,
        Permission::ManageLiability,
    ];

    #[test]
    fn full_access_satisfies_every_permission() {
        let permissions = vec![Permission::FullAccess];
        for required in ALL {
            assert!(has_permission(&permissions, required));
        }
    }

    #[test]
    fn specific_permission_only_satisfies_itself() {
        let permissions = vec![Permission::ManageEmployees];
        assert!(has_permission(&permissions, Permission::ManageEmployees));
        assert!(!has_permission(&permissions, Permission::ManageDepartments));
        assert!(!has_permission(&permissions, Permission::FullAccess));
    }

    #[test]
    fn empty_set_satisfies_nothing() {
        for required in ALL {
            assert!(!has_permission(&[], required));
        }
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("secret1").unwrap();
        assert_ne!(hash, "secret1");
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify_password("secret1", "not-a-phc-string").is_err());
    }
}
