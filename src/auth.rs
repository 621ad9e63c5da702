//! Session checks, login-page redirects and logout.
//!
//! The backend keeps the session in a cookie; the only client-side trace is
//! the cached username and the post-login destination in session storage.

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use crate::constants::LOGIN_PATH;
use crate::dom_utils;
use crate::error::ClientError;
use crate::network::ApiClient;
use crate::storage::{self, KeyValueStore, REDIRECT_AFTER_LOGIN_KEY};
use crate::{debug_log, warn_log};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub roles: Vec<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(ADMIN_ROLE))
    }
}

/// `GET /usuarios/rol`.  `Err(Unauthorized)` means "not logged in".
pub async fn probe_role(api: &ApiClient) -> Result<Session, ClientError> {
    let roles = api.fetch_roles().await?;
    debug_log!("session roles: {:?}", roles);
    Ok(Session { roles })
}

/// Probe the session; when it is gone, remember where the user was and go to
/// the login page.  Returns `None` in that case.
pub async fn require_session(api: &ApiClient) -> Option<Session> {
    match probe_role(api).await {
        Ok(session) => Some(session),
        Err(e) => {
            warn_log!("session check failed: {}", e);
            let current = dom_utils::window()
                .and_then(|w| w.location().pathname())
                .unwrap_or_default();
            storage::clear_session(false);
            if let Ok(store) = storage::session_storage() {
                let _ = KeyValueStore::set(&store, REDIRECT_AFTER_LOGIN_KEY, &current);
            }
            dom_utils::navigate(LOGIN_PATH);
            None
        }
    }
}

/// Clear session storage now and open the login page after `delay_ms`.
pub fn redirect_to_login(delay_ms: u32) {
    storage::clear_session(false);
    if delay_ms == 0 {
        dom_utils::navigate(LOGIN_PATH);
    } else {
        Timeout::new(delay_ms, || dom_utils::navigate(LOGIN_PATH)).forget();
    }
}

/// `POST /logout` (result ignored), wipe both storages, go to login.
pub async fn logout(api: &ApiClient) {
    if let Err(e) = api.logout().await {
        warn_log!("logout request failed: {}", e);
    }
    storage::clear_session(true);
    dom_utils::navigate(LOGIN_PATH);
}

/// Wire `#logout-link` when the page has one.
pub fn bind_logout_link(api: &ApiClient) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let Some(link) = document.get_element_by_id("logout-link") else {
        return Ok(());
    };
    let api = api.clone();
    dom_utils::on(&link, "click", move |e| {
        e.prevent_default();
        let api = api.clone();
        spawn_local(async move { logout(&api).await });
    })
}
