// src/pages/mod.rs
//
// One module per server-rendered page.  The host page names itself when it
// calls `init_page`, so nothing here guesses the page from the DOM.

use std::fmt;
use std::str::FromStr;

use wasm_bindgen::JsValue;

use crate::network::ApiClient;

pub mod chat;
pub mod dashboard;
pub mod login;
pub mod project_form;
pub mod user_form;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Landing and other static pages: only the shared behaviour.
    Home,
    Login,
    Chat,
    Dashboard,
    NewProject,
    EditProject,
    NewUser,
    EditUser,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Home => "home",
            PageKind::Login => "login",
            PageKind::Chat => "chat",
            PageKind::Dashboard => "dashboard",
            PageKind::NewProject => "new-project",
            PageKind::EditProject => "edit-project",
            PageKind::NewUser => "new-user",
            PageKind::EditUser => "edit-user",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = String;

    /// Accepts the canonical names plus the Spanish route names the
    /// templates use (`perfil`, `proyecto_nuevo`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "" | "home" | "index" | "landing" => Ok(PageKind::Home),
            "login" => Ok(PageKind::Login),
            "chat" => Ok(PageKind::Chat),
            "dashboard" | "perfil" | "profile" => Ok(PageKind::Dashboard),
            "new-project" | "proyecto-nuevo" => Ok(PageKind::NewProject),
            "edit-project" | "proyecto-editar" => Ok(PageKind::EditProject),
            "new-user" | "usuario-nuevo" => Ok(PageKind::NewUser),
            "edit-user" | "usuario-editar" => Ok(PageKind::EditUser),
            other => Err(format!("unknown page kind: {}", other)),
        }
    }
}

/// Run the page-specific initialisation.
pub fn init(kind: PageKind, resource_id: Option<String>, api: &ApiClient) -> Result<(), JsValue> {
    let resource_id = resource_id.filter(|id| !id.trim().is_empty());
    match kind {
        PageKind::Home => Ok(()),
        PageKind::Login => login::mount(api),
        PageKind::Chat => chat::mount(api),
        PageKind::Dashboard => dashboard::mount(api),
        PageKind::NewProject => project_form::mount_create(api),
        PageKind::EditProject => project_form::mount_edit(api, resource_id),
        PageKind::NewUser => user_form::mount_create(api),
        PageKind::EditUser => user_form::mount_edit(api, resource_id),
    }
}

/// Id carried in the path after `route`, used when the host passes no
/// resource id (`/perfil/usuario_editar/42` → `42`).
pub fn id_after_route(path: &str, route: &str) -> Option<String> {
    path.strip_prefix(route)?
        .strip_prefix('/')?
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
