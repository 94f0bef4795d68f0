//! Device identity management.
//!
//! Every installation is identified by an opaque token generated once and
//! persisted in the data directory. The server partitions configuration
//! and expense data by this token, so it must stay stable for the lifetime
//! of the storage.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{debug, warn};

/// Identity file name in the data directory.
const DEVICE_ID_FILE: &str = "device_id";

/// Length of the random suffix appended to the timestamp.
const SUFFIX_LENGTH: usize = 9;

pub struct IdentityStore {
    data_dir: PathBuf,
}

impl IdentityStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Return the persisted identity, generating and persisting a new one
    /// if none exists. Never fails: when the storage is unavailable the
    /// freshly generated identity is used ephemerally for this run.
    pub fn ensure(&self) -> String {
        match self.load() {
            Ok(Some(id)) => {
                debug!(device_id = %id, "Using existing device identity");
                return id;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read device identity, generating a new one");
            }
        }

        let id = Self::generate();
        if let Err(e) = self.persist(&id) {
            warn!(error = %e, "Failed to persist device identity, continuing with an ephemeral one");
        } else {
            debug!(device_id = %id, "Generated new device identity");
        }
        id
    }

    fn identity_path(&self) -> PathBuf {
        self.data_dir.join(DEVICE_ID_FILE)
    }

    fn load(&self) -> Result<Option<String>> {
        let path = self.identity_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read device identity file")?;
        let id = contents.trim().to_string();
        if id.is_empty() {
            return Ok(None);
        }
        Ok(Some(id))
    }

    fn persist(&self, id: &str) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.identity_path(), id)?;
        Ok(())
    }

    /// Time-based token with a random suffix: `device_<millis>_<suffix>`.
    fn generate() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LENGTH)
            .map(char::from)
            .collect();
        format!(
            "device_{}_{}",
            chrono::Utc::now().timestamp_millis(),
            suffix.to_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_data_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "walletcare-identity-test-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn test_ensure_is_stable_across_calls() {
        let dir = temp_data_dir();
        let store = IdentityStore::new(dir.clone());

        let first = store.ensure();
        let second = store.ensure();
        assert_eq!(first, second);

        // A fresh store over the same directory sees the same identity
        let other = IdentityStore::new(dir.clone());
        assert_eq!(other.ensure(), first);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_generated_identity_shape() {
        let id = IdentityStore::generate();
        assert!(id.starts_with("device_"));
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), SUFFIX_LENGTH);
    }

    #[test]
    fn test_regenerated_only_when_absent() {
        let dir = temp_data_dir();
        let store = IdentityStore::new(dir.clone());

        let first = store.ensure();
        std::fs::remove_file(dir.join(DEVICE_ID_FILE)).expect("identity file exists");
        let second = store.ensure();
        assert_ne!(first, second);

        let _ = std::fs::remove_dir_all(dir);
    }
}
