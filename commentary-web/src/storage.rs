use commentary_client::api::PreferenceStore;
use gloo_storage::{LocalStorage, Storage};

/// Preferences kept in the browser's local storage, shared by every page of the origin
pub struct LocalStoragePrefs;

impl PreferenceStore for LocalStoragePrefs {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::get(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = LocalStorage::set(key, value) {
            tracing::warn!(?err, key, "failed saving preference to local storage");
        }
    }
}
