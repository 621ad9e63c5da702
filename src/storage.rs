//! Browser storage slots used across page loads.
//!
//! Session storage: the one-shot cross-page alert (`alertMessage` /
//! `alertType`), the cached `username` and `redirect_after_login`.
//! Local storage: `proyectoEditar`, the project id handed to the edit page.

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::error::ClientError;
use crate::toast::{self, AlertKind};
use crate::{debug_log, warn_log};

pub const ALERT_MESSAGE_KEY: &str = "alertMessage";
pub const ALERT_TYPE_KEY: &str = "alertType";
pub const USERNAME_KEY: &str = "username";
pub const REDIRECT_AFTER_LOGIN_KEY: &str = "redirect_after_login";
pub const EDIT_PROJECT_KEY: &str = "proyectoEditar";

/// Minimal string key/value store so the slot logic can run against an
/// in-memory map in tests.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, JsValue>;
    fn set(&self, key: &str, value: &str) -> Result<(), JsValue>;
    fn remove(&self, key: &str) -> Result<(), JsValue>;
    fn clear(&self) -> Result<(), JsValue>;
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>, JsValue> {
        self.get_item(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), JsValue> {
        self.set_item(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), JsValue> {
        self.remove_item(key)
    }

    fn clear(&self) -> Result<(), JsValue> {
        Storage::clear(self)
    }
}

pub fn session_storage() -> Result<Storage, ClientError> {
    web_sys::window()
        .ok_or_else(|| ClientError::Environment("no global window exists".into()))?
        .session_storage()?
        .ok_or_else(|| ClientError::Environment("sessionStorage unavailable".into()))
}

pub fn local_storage() -> Result<Storage, ClientError> {
    web_sys::window()
        .ok_or_else(|| ClientError::Environment("no global window exists".into()))?
        .local_storage()?
        .ok_or_else(|| ClientError::Environment("localStorage unavailable".into()))
}

// ---------------------------------------------------------------------------
// Cross-page alert
// ---------------------------------------------------------------------------

pub fn save_alert<S: KeyValueStore>(store: &S, message: &str, kind: AlertKind) -> Result<(), JsValue> {
    store.set(ALERT_MESSAGE_KEY, message)?;
    store.set(ALERT_TYPE_KEY, kind.as_str())
}

/// Read and clear the saved alert.  Both keys must be present.
pub fn take_saved_alert<S: KeyValueStore>(store: &S) -> Result<Option<(String, AlertKind)>, JsValue> {
    let message = store.get(ALERT_MESSAGE_KEY)?;
    let kind = store.get(ALERT_TYPE_KEY)?;
    match (message, kind) {
        (Some(message), Some(kind)) if !message.is_empty() && !kind.is_empty() => {
            store.remove(ALERT_MESSAGE_KEY)?;
            store.remove(ALERT_TYPE_KEY)?;
            Ok(Some((message, AlertKind::parse(&kind))))
        }
        _ => Ok(None),
    }
}

/// Queue `message` to be shown as a toast on the next page load.
pub fn save_alert_for_next_page(message: &str, kind: AlertKind) {
    let saved = session_storage()
        .map_err(JsValue::from)
        .and_then(|store| save_alert(&store, message, kind));
    if let Err(e) = saved {
        warn_log!("could not persist alert, showing it now: {:?}", e);
        toast::show_alert(message, kind);
    }
}

/// Show (once) the alert queued by the previous page.
pub fn show_saved_alert() {
    let Ok(store) = session_storage() else {
        return;
    };
    match take_saved_alert(&store) {
        Ok(Some((message, kind))) => {
            debug_log!("showing saved alert: {}", message);
            toast::show_toast(&message, kind, crate::constants::DEFAULT_TOAST_DURATION_MS);
        }
        Ok(None) => {}
        Err(e) => warn_log!("failed to read saved alert: {:?}", e),
    }
}

// ---------------------------------------------------------------------------
// Session helpers
// ---------------------------------------------------------------------------

pub fn cache_username<S: KeyValueStore>(store: &S, username: &str) -> Result<(), JsValue> {
    store.set(USERNAME_KEY, username)
}

pub fn cached_username<S: KeyValueStore>(store: &S) -> Option<String> {
    store.get(USERNAME_KEY).ok().flatten().filter(|u| !u.is_empty())
}

/// Consume the post-login destination, if one was recorded.
pub fn take_redirect_after_login<S: KeyValueStore>(store: &S) -> Option<String> {
    let target = store.get(REDIRECT_AFTER_LOGIN_KEY).ok().flatten()?;
    let _ = store.remove(REDIRECT_AFTER_LOGIN_KEY);
    // Only same-origin paths are honoured.
    (target.starts_with('/') && !target.starts_with("//")).then_some(target)
}

pub fn set_project_to_edit<S: KeyValueStore>(store: &S, project_id: &str) -> Result<(), JsValue> {
    store.set(EDIT_PROJECT_KEY, project_id)
}

/// The id stored by the dashboard before navigating to the edit page.  The
/// slot is cleared once read.
pub fn take_project_to_edit<S: KeyValueStore>(store: &S) -> Option<String> {
    let id = store.get(EDIT_PROJECT_KEY).ok().flatten()?;
    let _ = store.remove(EDIT_PROJECT_KEY);
    (!id.is_empty()).then_some(id)
}

/// Wipe transient session data (session storage, and local storage when
/// `include_local` is set, as on logout).
pub fn clear_session(include_local: bool) {
    if let Ok(store) = session_storage() {
        let _ = KeyValueStore::clear(&store);
    }
    if include_local {
        if let Ok(store) = local_storage() {
            let _ = KeyValueStore::clear(&store);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory stand-in for `sessionStorage`.
    #[derive(Default)]
    pub struct MemoryStore {
        items: RefCell<HashMap<String, String>>,
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, JsValue> {
            Ok(self.items.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), JsValue> {
            self.items.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), JsValue> {
            self.items.borrow_mut().remove(key);
            Ok(())
        }

        fn clear(&self) -> Result<(), JsValue> {
            self.items.borrow_mut().clear();
            Ok(())
        }
    }

    #[test]
    fn saved_alert_is_taken_exactly_once() {
        let store = MemoryStore::default();
        save_alert(&store, "Proyecto creado con éxito", AlertKind::Success).unwrap();

        assert_eq!(
            take_saved_alert(&store).unwrap(),
            Some(("Proyecto creado con éxito".to_string(), AlertKind::Success))
        );
        // Reload: slot is empty.
        assert_eq!(take_saved_alert(&store).unwrap(), None);
    }

    #[test]
    fn half_written_alert_is_ignored() {
        let store = MemoryStore::default();
        store.set(ALERT_MESSAGE_KEY, "hola").unwrap();
        assert_eq!(take_saved_alert(&store).unwrap(), None);
    }

    #[test]
    fn redirect_target_must_be_local_path() {
        let store = MemoryStore::default();
        store.set(REDIRECT_AFTER_LOGIN_KEY, "//evil.example").unwrap();
        assert_eq!(take_redirect_after_login(&store), None);

        store.set(REDIRECT_AFTER_LOGIN_KEY, "/chat").unwrap();
        assert_eq!(take_redirect_after_login(&store).as_deref(), Some("/chat"));
        assert_eq!(take_redirect_after_login(&store), None);
    }

    #[test]
    fn edit_slot_round_trip_clears() {
        let store = MemoryStore::default();
        set_project_to_edit(&store, "p-7").unwrap();
        assert_eq!(take_project_to_edit(&store).as_deref(), Some("p-7"));
        assert_eq!(take_project_to_edit(&store), None);
    }

    #[test]
    fn username_cache_ignores_empty() {
        let store = MemoryStore::default();
        assert_eq!(cached_username(&store), None);
        cache_username(&store, "ana").unwrap();
        assert_eq!(cached_username(&store).as_deref(), Some("ana"));
    }
}
