// aws-extension-sqlite/src/secrets.rs
// ============================================================================
// Module: Session Secret Manager
// Description: In-memory, thread-safe store of key/value secrets.
// Purpose: Hold temporary secrets and answer scope lookups for paths.
// Dependencies: aws-extension-core, thiserror
// ============================================================================

//! ## Overview
//! Secrets are keyed by lowercased name and live for the lifetime of the
//! session. [`SecretManager::lookup`] picks the secret of the requested type
//! whose scope has the longest prefix match for a path; ties go to the
//! lexicographically smallest name so lookups are deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::MutexGuard;

use aws_extension_core::KeyValueSecret;
use aws_extension_core::OnConflict;
use aws_extension_core::SecretType;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Secret storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretStoreError {
    /// A secret with the same name already exists.
    #[error("secret store conflict: secret '{0}' already exists")]
    AlreadyExists(String),
    /// The store lock was poisoned.
    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Manager
// ============================================================================

/// Temporary secret store shared by a session's SQL functions.
#[derive(Default)]
pub struct SecretManager {
    /// Secrets keyed by lowercased name.
    secrets: Mutex<BTreeMap<String, KeyValueSecret>>,
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(secrets) = self.lock() else {
            return f.write_str("SecretManager { <unavailable> }");
        };
        f.debug_map()
            .entries(secrets.values().map(|secret| {
                (&secret.name, (secret.secret_type.label(), &secret.provider, &secret.scope))
            }))
            .finish()
    }
}

impl SecretManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the secret map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, KeyValueSecret>>, SecretStoreError> {
        self.secrets.lock().map_err(|_| SecretStoreError::Unavailable("mutex poisoned".to_string()))
    }

    /// Stores `secret` according to `on_conflict` and returns the secret now
    /// held under its name.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError::AlreadyExists`] when the name is taken and
    /// `on_conflict` is [`OnConflict::Error`].
    pub fn create(
        &self,
        mut secret: KeyValueSecret,
        on_conflict: OnConflict,
    ) -> Result<KeyValueSecret, SecretStoreError> {
        secret.name = secret.name.to_lowercase();
        let mut secrets = self.lock()?;
        if let Some(existing) = secrets.get(&secret.name) {
            match on_conflict {
                OnConflict::Error => {
                    return Err(SecretStoreError::AlreadyExists(secret.name));
                }
                OnConflict::Ignore => return Ok(existing.clone()),
                OnConflict::Replace => {}
            }
        }
        secrets.insert(secret.name.clone(), secret.clone());
        drop(secrets);
        Ok(secret)
    }

    /// Returns true when a secret named `name` exists.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError::Unavailable`] when the lock is poisoned.
    pub fn contains(&self, name: &str) -> Result<bool, SecretStoreError> {
        Ok(self.lock()?.contains_key(&name.to_lowercase()))
    }

    /// Removes a secret and returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError::Unavailable`] when the lock is poisoned.
    pub fn drop_secret(&self, name: &str) -> Result<bool, SecretStoreError> {
        Ok(self.lock()?.remove(&name.to_lowercase()).is_some())
    }

    /// Returns a secret by name.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError::Unavailable`] when the lock is poisoned.
    pub fn get(&self, name: &str) -> Result<Option<KeyValueSecret>, SecretStoreError> {
        Ok(self.lock()?.get(&name.to_lowercase()).cloned())
    }

    /// Returns all secrets sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError::Unavailable`] when the lock is poisoned.
    pub fn list(&self) -> Result<Vec<KeyValueSecret>, SecretStoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Returns the best-matching secret of `secret_type` for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError::Unavailable`] when the lock is poisoned.
    pub fn lookup(
        &self,
        path: &str,
        secret_type: SecretType,
    ) -> Result<Option<KeyValueSecret>, SecretStoreError> {
        let secrets = self.lock()?;
        let mut best: Option<(usize, &KeyValueSecret)> = None;
        for secret in secrets.values().filter(|secret| secret.secret_type == secret_type) {
            let Some(score) = secret.match_score(path) else {
                continue;
            };
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, secret));
            }
        }
        Ok(best.map(|(_, secret)| secret.clone()))
    }
}

#[cfg(test)]
mod tests {
    use aws_extension_core::KeyValueSecret;
    use aws_extension_core::OnConflict;
    use aws_extension_core::SecretType;

    use super::SecretManager;
    use super::SecretStoreError;

    fn secret(name: &str, secret_type: SecretType, scope: &[&str]) -> KeyValueSecret {
        KeyValueSecret::new(
            name.to_string(),
            secret_type,
            "credential_chain".to_string(),
            scope.iter().map(|prefix| (*prefix).to_string()).collect(),
        )
    }

    #[test]
    fn duplicate_names_follow_conflict_policy() {
        let manager = SecretManager::new();
        let first = secret("Prod", SecretType::S3, &["s3://"]);
        assert!(manager.create(first, OnConflict::Error).is_ok());

        let again = secret("prod", SecretType::S3, &["s3://bucket"]);
        assert_eq!(
            manager.create(again.clone(), OnConflict::Error),
            Err(SecretStoreError::AlreadyExists("prod".to_string()))
        );
        let kept = manager.create(again.clone(), OnConflict::Ignore);
        assert_eq!(kept.map(|secret| secret.scope), Ok(vec!["s3://".to_string()]));
        let replaced = manager.create(again, OnConflict::Replace);
        assert_eq!(replaced.map(|secret| secret.scope), Ok(vec!["s3://bucket".to_string()]));
    }

    #[test]
    fn lookup_prefers_longest_prefix_of_matching_type() {
        let manager = SecretManager::new();
        for candidate in [
            secret("broad", SecretType::S3, &["s3://"]),
            secret("narrow", SecretType::S3, &["s3://bucket/logs"]),
            secret("other_type", SecretType::R2, &["s3://bucket/logs/2024"]),
        ] {
            assert!(manager.create(candidate, OnConflict::Error).is_ok());
        }
        let found = manager.lookup("s3://bucket/logs/a.parquet", SecretType::S3);
        assert_eq!(found.ok().flatten().map(|secret| secret.name), Some("narrow".to_string()));
        let found = manager.lookup("s3://elsewhere/a.parquet", SecretType::S3);
        assert_eq!(found.ok().flatten().map(|secret| secret.name), Some("broad".to_string()));
        let found = manager.lookup("gs://bucket", SecretType::S3);
        assert_eq!(found, Ok(None));
    }

    #[test]
    fn drop_reports_existence() {
        let manager = SecretManager::new();
        assert!(manager.create(secret("temp", SecretType::Gcs, &["gs://"]), OnConflict::Error).is_ok());
        assert_eq!(manager.drop_secret("TEMP"), Ok(true));
        assert_eq!(manager.drop_secret("temp"), Ok(false));
    }
}
