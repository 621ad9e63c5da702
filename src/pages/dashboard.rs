// src/pages/dashboard.rs
//
// Profile dashboard (`/perfil`): project cards for everyone, user cards for
// admins.  Card buttons are handled by one delegated listener per container.

use chrono::{DateTime, Utc};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event};

use crate::auth;
use crate::constants::{CHAT_PATH, EDIT_PROJECT_PATH, EDIT_USER_PATH, NEW_PROJECT_PATH, NEW_USER_PATH};
use crate::dom_utils;
use crate::error::ClientError;
use crate::models::{Project, User};
use crate::network::ApiClient;
use crate::storage;
use crate::toast;
use crate::utils::{escape_html, relative_date};
use crate::{debug_log, error_log, warn_log};

const PERSONAL_INFO_CONTAINER_ID: &str = "informacion-personal-container";
const PROJECTS_CONTAINER_ID: &str = "proyectos-container";
const USERS_CONTAINER_ID: &str = "usuarios-container";
const PROJECT_CARD_CLASS: &str = "proyecto-card-col";
const USER_CARD_CLASS: &str = "usuario-card-col";
const UNKNOWN_OWNER: &str = "Desconocido";

// ---------------------------------------------------------------------------
// Markup
// ---------------------------------------------------------------------------

fn date_or_na(raw: Option<&str>, now: DateTime<Utc>) -> String {
    raw.map(|r| relative_date(r, now))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Username of the project's owner, when it is among `users`.
pub fn owner_name<'a>(project: &Project, users: &'a [User]) -> Option<&'a str> {
    let owner = project.owner_id.as_deref()?;
    users
        .iter()
        .find(|u| u.id == owner)
        .map(|u| u.username.as_str())
}

pub fn project_card_markup(project: &Project, owner: Option<&str>, now: DateTime<Utc>) -> String {
    let id = escape_html(&project.id);
    let description = project
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("Sin descripción");
    format!(
        r#"<div class="card h-100 project-card">
    <div class="card-header project-header">
        <div class="project-icon"><i class="fas fa-project-diagram"></i></div>
        <div class="project-actions">
            <button type="button" class="btn btn-sm btn-outline-light btn-project-chat" data-proyecto-id="{id}" title="Abrir en chat"><i class="fas fa-comments"></i></button>
        </div>
    </div>
    <div class="card-body">
        <h5 class="card-title project-title">{name}</h5>
        <p class="card-text project-description">{description}</p>
        <div class="project-meta">
            <div class="meta-item"><i class="fas fa-user me-2"></i><span><strong>Propietario:</strong> {owner}</span></div>
            <div class="meta-item"><i class="fas fa-shield-alt me-2"></i><span><strong>Umbral:</strong> {threshold} · {severity}</span></div>
            <div class="meta-item"><i class="fas fa-calendar-plus me-2"></i><span><strong>Creado:</strong></span><div class="fecha-info">{created}</div></div>
            <div class="meta-item"><i class="fas fa-edit me-2"></i><span><strong>Modificado:</strong></span><div class="fecha-info">{updated}</div></div>
        </div>
    </div>
    <div class="card-footer project-footer">
        <button type="button" class="btn btn-primary btn-editar-proyecto" data-proyecto-id="{id}"><i class="fas fa-edit me-2"></i>Editar</button>
        <button type="button" class="btn btn-danger btn-eliminar-proyecto" data-proyecto-id="{id}"><i class="fas fa-trash me-2"></i>Eliminar</button>
    </div>
</div>"#,
        id = id,
        name = escape_html(&project.name),
        description = escape_html(description),
        owner = escape_html(owner.unwrap_or(UNKNOWN_OWNER)),
        threshold = project.vulnerability_threshold,
        severity = project.max_severity,
        created = escape_html(&date_or_na(project.created_at.as_deref(), now)),
        updated = escape_html(&date_or_na(project.updated_at.as_deref(), now)),
    )
}

pub fn user_card_markup(user: &User) -> String {
    let id = escape_html(&user.id);
    format!(
        r#"<div class="card h-100 user-card">
    <div class="card-body">
        <div class="user-avatar"><i class="fas fa-user-circle"></i></div>
        <h5 class="card-title">{username}</h5>
        <p class="card-text mb-1">{nombre} {apellidos}</p>
        <p class="card-text text-muted"><i class="fas fa-envelope me-2"></i>{email}</p>
    </div>
    <div class="card-footer">
        <button type="button" class="btn btn-primary btn-editar-usuario" data-usuario-id="{id}"><i class="fas fa-edit me-2"></i>Editar</button>
        <button type="button" class="btn btn-danger btn-eliminar-usuario" data-usuario-id="{id}"><i class="fas fa-trash me-2"></i>Eliminar</button>
    </div>
</div>"#,
        id = id,
        username = escape_html(&user.username),
        nombre = escape_html(&user.nombre),
        apellidos = escape_html(&user.apellidos),
        email = escape_html(&user.email),
    )
}

/// "Mi Perfil" header plus the personal-info card of the logged-in user.
pub fn personal_info_markup(user: &User, now: DateTime<Utc>) -> String {
    let field = |icon: &str, label: &str, value: &str, width: &str| {
        format!(
            r#"<div class="{width}"><div class="info-group"><label class="info-label"><i class="fas {icon} me-2"></i>{label}</label><div class="info-value">{value}</div></div></div>"#,
            width = width,
            icon = icon,
            label = label,
            value = escape_html(value),
        )
    };
    let member_since = date_or_na(user.created_at.as_deref(), now);
    format!(
        r#"<div class="col-12 mb-4">
    <div class="panel-header">
        <h3><i class="fas fa-user-circle me-2"></i>Mi Perfil</h3>
        <a href="{edit}/{id}" class="btn btn-primary"><i class="fas fa-edit me-2"></i>Editar Perfil</a>
    </div>
</div>
<div class="col-12">
    <div class="card personal-info-card">
        <div class="card-header personal-info-header">
            <div class="user-avatar"><i class="fas fa-user-circle"></i></div>
            <h5 class="mb-0">Información Personal</h5>
        </div>
        <div class="card-body">
            <div class="row">{username}{email}{nombre}{apellidos}{since}</div>
        </div>
    </div>
</div>"#,
        edit = EDIT_USER_PATH,
        id = escape_html(&user.id),
        username = field("fa-at", "Nombre de Usuario", &user.username, "col-md-6"),
        email = field("fa-envelope", "Email", &user.email, "col-md-6"),
        nombre = field("fa-user", "Nombre", &user.nombre, "col-md-6"),
        apellidos = field("fa-users", "Apellidos", &user.apellidos, "col-md-6"),
        since = field("fa-calendar-plus", "Miembro desde", &member_since, "col-12"),
    )
}

fn projects_empty_markup() -> String {
    format!(
        r#"<div class="col-12 empty-state">
    <div class="empty-state-icon"><i class="fas fa-project-diagram"></i></div>
    <h3 class="empty-state-title">No hay proyectos</h3>
    <p class="empty-state-description">Crea tu primer proyecto para comenzar a trabajar con el asistente de desarrollo seguro.</p>
    <div class="empty-state-actions">
        <a href="{new}" class="btn btn-primary btn-lg"><i class="fas fa-plus me-2"></i>Crear Mi Primer Proyecto</a>
        <a href="{chat}" class="btn btn-outline-primary btn-lg"><i class="fas fa-comments me-2"></i>Ir al Chat General</a>
    </div>
</div>"#,
        new = NEW_PROJECT_PATH,
        chat = CHAT_PATH,
    )
}

fn users_empty_markup() -> String {
    format!(
        r#"<div class="col-12 empty-state">
    <div class="empty-state-icon"><i class="fas fa-users"></i></div>
    <h3 class="empty-state-title">No hay usuarios</h3>
    <a href="{new}" class="btn btn-primary"><i class="fas fa-user-plus me-2"></i>Crear Usuario</a>
</div>"#,
        new = NEW_USER_PATH,
    )
}

fn load_error_markup(what: &str, error: &ClientError) -> String {
    format!(
        r#"<div class="col-12 alert alert-danger">Error al cargar {}: {}</div>"#,
        what,
        escape_html(&error.to_string())
    )
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub fn mount(api: &ApiClient) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let personal = document.get_element_by_id(PERSONAL_INFO_CONTAINER_ID);
    let projects = document.get_element_by_id(PROJECTS_CONTAINER_ID);
    let users = document.get_element_by_id(USERS_CONTAINER_ID);
    if personal.is_none() && projects.is_none() && users.is_none() {
        warn_log!("dashboard without card containers");
        return Ok(());
    }
    if let Some(container) = &projects {
        bind_project_actions(container, api)?;
    }
    if let Some(container) = &users {
        bind_user_actions(container, api)?;
    }

    let api = api.clone();
    spawn_local(async move {
        let Some(session) = auth::require_session(&api).await else {
            return;
        };
        if let Some(container) = personal {
            if !load_personal_info(&api, &container).await {
                return;
            }
        }
        if let Err(e) = load(&document, &api, session.is_admin(), projects, users).await {
            error_log!("dashboard render failed: {:?}", e);
        }
    });
    Ok(())
}

/// Fills the profile panel.  Returns `false` when the session is gone and
/// the page is already on its way to the login screen.
async fn load_personal_info(api: &ApiClient, container: &Element) -> bool {
    match api.get_profile().await {
        Ok(user) => {
            container.set_inner_html(&personal_info_markup(&user, Utc::now()));
            true
        }
        Err(ClientError::Unauthorized) => {
            auth::redirect_to_login(0);
            false
        }
        Err(e) => {
            warn_log!("personal info unavailable: {}", e);
            container.set_inner_html(&load_error_markup("la información personal", &e));
            true
        }
    }
}

async fn load(
    document: &Document,
    api: &ApiClient,
    is_admin: bool,
    projects_container: Option<Element>,
    users_container: Option<Element>,
) -> Result<(), JsValue> {
    debug_log!("loading dashboard (admin: {})", is_admin);
    let users = if is_admin {
        match api.list_users().await {
            Ok(users) => Ok(users),
            Err(ClientError::Unauthorized) => {
                auth::redirect_to_login(0);
                return Ok(());
            }
            Err(e) => Err(e),
        }
    } else {
        Ok(Vec::new())
    };

    if let Some(container) = &projects_container {
        match api.list_projects().await {
            Ok(projects) => {
                let known_users = users.as_deref().unwrap_or_default();
                let fallback_owner = if is_admin {
                    None
                } else {
                    storage::session_storage()
                        .ok()
                        .and_then(|store| storage::cached_username(&store))
                };
                render_projects(document, container, &projects, known_users, fallback_owner.as_deref())?;
            }
            Err(ClientError::Unauthorized) => {
                auth::redirect_to_login(0);
                return Ok(());
            }
            Err(e) => container.set_inner_html(&load_error_markup("los proyectos", &e)),
        }
    }

    if let Some(container) = &users_container {
        if is_admin {
            match &users {
                Ok(users) => render_users(document, container, users)?,
                Err(e) => container.set_inner_html(&load_error_markup("los usuarios", e)),
            }
        } else {
            dom_utils::hide(container);
        }
    }
    Ok(())
}

fn render_projects(
    document: &Document,
    container: &Element,
    projects: &[Project],
    users: &[User],
    fallback_owner: Option<&str>,
) -> Result<(), JsValue> {
    container.set_inner_html("");
    if projects.is_empty() {
        container.set_inner_html(&projects_empty_markup());
        return Ok(());
    }
    let now = Utc::now();
    for (index, project) in projects.iter().enumerate() {
        let owner = owner_name(project, users).or(fallback_owner);
        let col = document.create_element("div")?;
        col.set_class_name(&format!("col-lg-6 col-xl-4 mb-4 {}", PROJECT_CARD_CLASS));
        col.set_attribute("data-proyecto-id", &project.id)?;
        col.set_attribute("style", &format!("animation-delay: {:.1}s", index as f64 * 0.1))?;
        col.set_inner_html(&project_card_markup(project, owner, now));
        container.append_child(&col)?;
    }
    Ok(())
}

fn render_users(document: &Document, container: &Element, users: &[User]) -> Result<(), JsValue> {
    container.set_inner_html("");
    if users.is_empty() {
        container.set_inner_html(&users_empty_markup());
        return Ok(());
    }
    for user in users {
        let col = document.create_element("div")?;
        col.set_class_name(&format!("col-lg-6 col-xl-4 mb-4 {}", USER_CARD_CLASS));
        col.set_attribute("data-usuario-id", &user.id)?;
        col.set_inner_html(&user_card_markup(user));
        container.append_child(&col)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Card actions
// ---------------------------------------------------------------------------

/// The button matching `selector` that the click landed on, if any.
fn clicked_button(e: &Event, selector: &str) -> Option<Element> {
    e.target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(selector).ok().flatten())
}

fn bind_project_actions(container: &Element, api: &ApiClient) -> Result<(), JsValue> {
    let api = api.clone();
    let container_ref = container.clone();
    dom_utils::on(container, "click", move |e| {
        if let Some(button) = clicked_button(&e, ".btn-editar-proyecto") {
            if let Some(id) = button.get_attribute("data-proyecto-id") {
                edit_project(&id);
            }
        } else if let Some(button) = clicked_button(&e, ".btn-eliminar-proyecto") {
            if let Some(id) = button.get_attribute("data-proyecto-id") {
                delete_project(&container_ref, &api, id);
            }
        } else if clicked_button(&e, ".btn-project-chat").is_some() {
            dom_utils::navigate(CHAT_PATH);
        }
    })
}

fn bind_user_actions(container: &Element, api: &ApiClient) -> Result<(), JsValue> {
    let api = api.clone();
    let container_ref = container.clone();
    dom_utils::on(container, "click", move |e| {
        if let Some(button) = clicked_button(&e, ".btn-editar-usuario") {
            if let Some(id) = button.get_attribute("data-usuario-id") {
                dom_utils::navigate(&format!("{}/{}", EDIT_USER_PATH, id));
            }
        } else if let Some(button) = clicked_button(&e, ".btn-eliminar-usuario") {
            if let Some(id) = button.get_attribute("data-usuario-id") {
                delete_user(&container_ref, &api, id);
            }
        }
    })
}

fn edit_project(id: &str) {
    match storage::local_storage() {
        Ok(store) => {
            if let Err(e) = storage::set_project_to_edit(&store, id) {
                warn_log!("could not remember project to edit: {:?}", e);
            }
        }
        Err(e) => warn_log!("{}", e),
    }
    dom_utils::navigate(&format!("{}/{}", EDIT_PROJECT_PATH, id));
}

fn delete_project(container: &Element, api: &ApiClient, id: String) {
    if !dom_utils::confirm("¿Estás seguro de que quieres eliminar este proyecto? Esta acción no se puede deshacer.") {
        return;
    }
    let container = container.clone();
    let api = api.clone();
    spawn_local(async move {
        match api.delete_project(&id).await {
            Ok(()) => {
                toast::success("Proyecto eliminado con éxito");
                remove_card(&container, PROJECT_CARD_CLASS, "data-proyecto-id", &id, projects_empty_markup);
            }
            Err(ClientError::Unauthorized) => auth::redirect_to_login(0),
            Err(e) => toast::error(&format!("Error al eliminar el proyecto: {}", e)),
        }
    });
}

fn delete_user(container: &Element, api: &ApiClient, id: String) {
    if !dom_utils::confirm("¿Estás seguro de que quieres eliminar este usuario? Esta acción no se puede deshacer.") {
        return;
    }
    let container = container.clone();
    let api = api.clone();
    spawn_local(async move {
        match api.delete_user(&id).await {
            Ok(()) => {
                toast::success("Usuario eliminado con éxito");
                remove_card(&container, USER_CARD_CLASS, "data-usuario-id", &id, users_empty_markup);
            }
            Err(ClientError::Unauthorized) => auth::redirect_to_login(0),
            Err(e) => toast::error(&format!("Error al eliminar el usuario: {}", e)),
        }
    });
}

/// Drop the card for `id`; show the empty state once the last one is gone.
fn remove_card(container: &Element, card_class: &str, id_attr: &str, id: &str, empty: fn() -> String) {
    let Ok(cards) = container.query_selector_all(&format!(".{}", card_class)) else {
        return;
    };
    let mut remaining = 0;
    for i in 0..cards.length() {
        let Some(card) = cards.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        if card.get_attribute(id_attr).as_deref() == Some(id) {
            card.remove();
        } else {
            remaining += 1;
        }
    }
    if remaining == 0 {
        container.set_inner_html(&empty());
    }
}
