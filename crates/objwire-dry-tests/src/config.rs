// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory policy store for testing without filesystem I/O.

use objwire_core::{PolicyError, PolicyStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory [`PolicyStore`] with failure injection.
///
/// Clones share state, so a test can load and save through one clone and
/// inspect the other.
///
/// # Example
///
/// ```
/// use objwire_dry_tests::InMemoryPolicyStore;
/// use objwire_core::EncodingPolicy;
///
/// let store = InMemoryPolicyStore::new();
///
/// assert_eq!(EncodingPolicy::load(&store).unwrap(), EncodingPolicy::default());
/// assert_eq!(store.read_count(), 1);
/// assert_eq!(store.write_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryPolicyStore {
    inner: Arc<Mutex<Documents>>,
}

#[derive(Default)]
struct Documents {
    by_key: HashMap<String, Vec<u8>>,
    read_count: usize,
    write_count: usize,
    fail_on_read: bool,
    fail_on_write: bool,
}

impl InMemoryPolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `document` under `key`.
    pub fn with_document(key: &str, document: &[u8]) -> Self {
        let store = Self::new();
        store.lock().by_key.insert(key.to_owned(), document.to_vec());
        store
    }

    fn lock(&self) -> MutexGuard<'_, Documents> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every read fail.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.lock().fail_on_read = fail;
    }

    /// Make every write fail.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.lock().fail_on_write = fail;
    }

    /// Number of reads attempted, failed ones included.
    pub fn read_count(&self) -> usize {
        self.lock().read_count
    }

    /// Number of writes attempted, failed ones included.
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    /// Document stored under `key`.
    pub fn document(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().by_key.get(key).cloned()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PolicyError> {
        let mut inner = self.lock();
        inner.read_count += 1;
        if inner.fail_on_read {
            return Err(PolicyError::Store("simulated read failure".into()));
        }
        Ok(inner.by_key.get(key).cloned())
    }

    fn write(&self, key: &str, document: &[u8]) -> Result<(), PolicyError> {
        let mut inner = self.lock();
        inner.write_count += 1;
        if inner.fail_on_write {
            return Err(PolicyError::Store("simulated write failure".into()));
        }
        inner.by_key.insert(key.to_owned(), document.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use objwire_core::{EncodingPolicy, POLICY_KEY};

    #[test]
    fn policy_survives_a_save_and_load() {
        let store = InMemoryPolicyStore::new();
        let policy = EncodingPolicy {
            server_retrieve_depth: 12,
            ..EncodingPolicy::default()
        };
        policy.save(&store).unwrap();
        assert!(store.document(POLICY_KEY).is_some());
        assert_eq!(EncodingPolicy::load(&store).unwrap(), policy);
    }

    #[test]
    fn stored_partial_policy_keeps_other_defaults() {
        let store =
            InMemoryPolicyStore::with_document(POLICY_KEY, br#"{"client_update_depth": 3}"#);
        let policy = EncodingPolicy::load(&store).unwrap();
        assert_eq!(policy.client_update_depth, 3);
        assert_eq!(policy.transient_graph_depth, 100);
    }

    #[test]
    fn empty_document_means_defaults() {
        let store = InMemoryPolicyStore::with_document(POLICY_KEY, b"");
        assert_eq!(
            EncodingPolicy::load(&store).unwrap(),
            EncodingPolicy::default()
        );
    }

    #[test]
    fn read_failure_surfaces() {
        let store = InMemoryPolicyStore::new();
        store.set_fail_on_read(true);
        assert!(matches!(
            EncodingPolicy::load(&store),
            Err(PolicyError::Store(_))
        ));
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn failed_write_stores_nothing() {
        let store = InMemoryPolicyStore::new();
        store.set_fail_on_write(true);
        assert!(EncodingPolicy::default().save(&store).is_err());
        assert_eq!(store.write_count(), 1);
        assert!(store.document(POLICY_KEY).is_none());
    }

    #[test]
    fn garbage_document_is_malformed() {
        let store = InMemoryPolicyStore::with_document(POLICY_KEY, b"{not json");
        assert!(matches!(
            EncodingPolicy::load(&store),
            Err(PolicyError::Malformed(_))
        ));
    }
}
