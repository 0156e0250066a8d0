use std::collections::HashMap;

use parking_lot::Mutex;

use crate::api::PreferenceStore;

/// Preference store that forgets everything once dropped
#[derive(Debug, Default)]
pub struct MemoryStore(Mutex<HashMap<String, String>>);

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.0.lock().insert(String::from(key), String::from(value));
    }
}
