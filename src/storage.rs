//! Key/value credential storage and its observing wrapper

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::capture::AuthEventType;
use crate::capture::mask::is_auth_key;
use crate::monitor::AuthMonitor;

/// Minimal storage contract, modelled on browser `Storage`
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().remove(key);
    }
}

/// Reports reads and writes of credential-looking keys to an [`AuthMonitor`].
/// Every call is forwarded unchanged.
pub struct ObservedStorage<S> {
    inner: S,
    name: String,
    monitor: Arc<AuthMonitor>,
}

impl<S: KeyValueStorage> ObservedStorage<S> {
    pub fn new(inner: S, name: &str, monitor: Arc<AuthMonitor>) -> Self {
        Self {
            inner,
            name: name.to_string(),
            monitor,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: KeyValueStorage> KeyValueStorage for ObservedStorage<S> {
    fn get_item(&self, key: &str) -> Option<String> {
        let value = self.inner.get_item(key);
        if is_auth_key(key) {
            self.monitor
                .record_storage(AuthEventType::StorageGet, &self.name, key, value.as_deref());
        }
        value
    }

    fn set_item(&self, key: &str, value: &str) {
        if is_auth_key(key) {
            self.monitor
                .record_storage(AuthEventType::StorageSet, &self.name, key, Some(value));
        }
        self.inner.set_item(key, value);
    }

    fn remove_item(&self, key: &str) {
        if is_auth_key(key) {
            self.monitor
                .record_storage(AuthEventType::StorageRemove, &self.name, key, None);
        }
        self.inner.remove_item(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeConfig;

    fn observed() -> (ObservedStorage<MemoryStorage>, Arc<AuthMonitor>) {
        let monitor = Arc::new(AuthMonitor::new(&ScopeConfig::default()));
        let storage = ObservedStorage::new(MemoryStorage::new(), "localStorage", monitor.clone());
        (storage, monitor)
    }

    #[test]
    fn test_storage_behaviour_is_unchanged() {
        let (storage, _) = observed();
        storage.set_item("devin_token", "abcdef123456");
        assert_eq!(storage.get_item("devin_token").as_deref(), Some("abcdef123456"));
        assert_eq!(
            storage.inner().get_item("devin_token").as_deref(),
            Some("abcdef123456")
        );

        storage.remove_item("devin_token");
        assert!(storage.get_item("devin_token").is_none());
    }

    #[test]
    fn test_only_auth_keys_recorded() {
        let (storage, monitor) = observed();
        storage.set_item("theme", "dark");
        storage.set_item("AuthToken", "abcdef123456");
        storage.get_item("AuthToken");
        storage.remove_item("AuthToken");

        let events = monitor.get_events();
        let kinds: Vec<AuthEventType> = events.iter().rev().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                AuthEventType::StorageSet,
                AuthEventType::StorageGet,
                AuthEventType::StorageRemove
            ]
        );
        assert!(events.iter().all(|e| e.storage.as_deref() == Some("localStorage")));
        assert_eq!(events[2].value.as_deref(), Some("abcd...3456"));
        assert!(events[0].value.is_none());
    }
}
