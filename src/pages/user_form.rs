// src/pages/user_form.rs
//
// Create and edit forms for user accounts (admin area).

use std::cell::Cell;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlButtonElement};

use crate::auth;
use crate::constants::{EDIT_USER_PATH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH, PROFILE_PATH};
use crate::dom_utils;
use crate::error::ClientError;
use crate::models::{User, UserPayload};
use crate::network::ApiClient;
use crate::storage;
use crate::toast::{self, AlertKind};
use crate::utils::escape_html;
use crate::{debug_log, error_log, warn_log};

/// The new-user template either names the form itself or wraps it.
const CREATE_FORM_SELECTOR: &str = "#crear-usuario-form, form#usuario-nuevo-form, #usuario-nuevo-form form";
const EDIT_CONTAINER_ID: &str = "usuario-editar-container";
const EDIT_FORM_ID: &str = "editar-usuario-form";

pub const CREATED_MESSAGE: &str = "¡Usuario creado con éxito!";
pub const UPDATED_MESSAGE: &str = "Usuario actualizado con éxito";

const MIN_NAME_LENGTH: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFormInput {
    pub username: String,
    pub nombre: String,
    pub apellidos: String,
    pub email: String,
    pub password: String,
    pub roles: String,
}

fn username_charset_ok(username: &str) -> bool {
    static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
    USERNAME_RE
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("valid username regex"))
        .is_match(username)
}

/// `local@domain.tld`: one `@`, no whitespace, a dot inside the domain.
pub fn looks_like_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
        .is_match(email)
}

/// Every problem is reported at once.  With `is_update`, an empty password
/// keeps the current one.
pub fn validate_user_form(input: &UserFormInput, is_update: bool) -> Result<UserPayload, ClientError> {
    let username = input.username.trim();
    let nombre = input.nombre.trim();
    let apellidos = input.apellidos.trim();
    let email = input.email.trim();
    let mut errors = Vec::new();

    if username.chars().count() < MIN_USERNAME_LENGTH || !username_charset_ok(username) {
        errors.push(format!(
            "El nombre de usuario debe tener al menos {} caracteres y solo puede contener letras, números, puntos, guiones y guiones bajos",
            MIN_USERNAME_LENGTH
        ));
    }
    if nombre.chars().count() < MIN_NAME_LENGTH {
        errors.push(format!("El nombre debe tener al menos {} caracteres", MIN_NAME_LENGTH));
    }
    if apellidos.chars().count() < MIN_NAME_LENGTH {
        errors.push(format!("Los apellidos deben tener al menos {} caracteres", MIN_NAME_LENGTH));
    }
    if !looks_like_email(email) {
        errors.push("El email no tiene un formato válido".to_string());
    }

    let password = if input.password.is_empty() && is_update {
        None
    } else if input.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "La contraseña debe tener al menos {} caracteres",
            MIN_PASSWORD_LENGTH
        ));
        None
    } else {
        Some(input.password.clone())
    };

    if !errors.is_empty() {
        return Err(ClientError::Validation(errors.join(". ")));
    }
    let roles = input.roles.trim();
    Ok(UserPayload {
        username: username.to_string(),
        nombre: nombre.to_string(),
        apellidos: apellidos.to_string(),
        email: email.to_string(),
        password,
        roles: (!roles.is_empty()).then(|| roles.to_string()),
    })
}

fn read_form(document: &Document) -> UserFormInput {
    let value = |id| dom_utils::field_value(document, id);
    UserFormInput {
        username: value("username"),
        nombre: value("nombre"),
        apellidos: value("apellidos"),
        email: value("email"),
        password: value("password"),
        roles: value("roles"),
    }
}

pub fn edit_form_markup(user: &User) -> String {
    let input = |id: &str, kind: &str, label: &str, value: &str| {
        format!(
            r#"<div class="form-group">
    <label for="{id}" class="form-label">{label}</label>
    <input type="{kind}" id="{id}" name="{id}" class="form-control" value="{value}">
</div>"#,
            id = id,
            kind = kind,
            label = label,
            value = escape_html(value),
        )
    };
    format!(
        r#"<div class="form-card">
    <div class="form-card-header">
        <div class="form-icon"><i class="fas fa-user-edit"></i></div>
        <h3 class="form-title">Editar Usuario</h3>
        <p class="form-subtitle">Actualiza los datos de: <strong>{username}</strong></p>
    </div>
    <div class="form-card-body">
        <form id="{form_id}" novalidate>
{fields}
            <div class="form-group">
                <label for="password" class="form-label">Nueva contraseña</label>
                <input type="password" id="password" name="password" class="form-control" autocomplete="new-password" placeholder="Déjala en blanco para mantener la actual">
            </div>
            <div class="form-actions">
                <button type="submit" class="btn btn-primary btn-lg"><i class="fas fa-save me-2"></i>Guardar Cambios</button>
                <a href="{profile}" class="btn btn-secondary btn-lg"><i class="fas fa-times me-2"></i>Cancelar</a>
            </div>
        </form>
    </div>
</div>"#,
        username = escape_html(&user.username),
        form_id = EDIT_FORM_ID,
        fields = [
            input("username", "text", "Nombre de usuario", &user.username),
            input("nombre", "text", "Nombre", &user.nombre),
            input("apellidos", "text", "Apellidos", &user.apellidos),
            input("email", "email", "Email", &user.email),
        ]
        .join("\n"),
        profile = PROFILE_PATH,
    )
}

#[derive(Debug, Clone)]
enum SaveMode {
    Create,
    Update(String),
}

pub fn mount_create(api: &ApiClient) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let Some(form) = document.query_selector(CREATE_FORM_SELECTOR)? else {
        warn_log!("new-user page without a form");
        return Ok(());
    };
    bind_submit(&document, &form, api, SaveMode::Create)
}

pub fn mount_edit(api: &ApiClient, resource_id: Option<String>) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let Some(container) = document.get_element_by_id(EDIT_CONTAINER_ID) else {
        warn_log!("edit-user page without #{}", EDIT_CONTAINER_ID);
        return Ok(());
    };
    let from_path = dom_utils::window()
        .and_then(|w| w.location().pathname())
        .ok()
        .and_then(|path| super::id_after_route(&path, EDIT_USER_PATH));
    let Some(user_id) = resource_id.or(from_path) else {
        container.set_inner_html(&format!(
            r#"<div class="alert alert-warning">No se ha indicado ningún usuario. <a href="{}">Volver al perfil</a></div>"#,
            PROFILE_PATH
        ));
        return Ok(());
    };

    container.set_inner_html(
        r#"<div class="loading-container"><i class="fas fa-spinner fa-spin fa-2x"></i><p>Cargando datos del usuario...</p></div>"#,
    );
    let api = api.clone();
    spawn_local(async move {
        match api.get_user(&user_id).await {
            Ok(user) => {
                debug_log!("editing user {}", user.id);
                container.set_inner_html(&edit_form_markup(&user));
                let bound = document
                    .get_element_by_id(EDIT_FORM_ID)
                    .ok_or_else(|| JsValue::from_str("edit form missing after render"))
                    .and_then(|form| bind_submit(&document, &form, &api, SaveMode::Update(user.id.clone())));
                if let Err(e) = bound {
                    error_log!("could not wire the edit form: {:?}", e);
                }
            }
            Err(ClientError::Unauthorized) => auth::redirect_to_login(0),
            Err(e) => container.set_inner_html(&format!(
                r#"<div class="alert alert-danger">Error al cargar el usuario: {} <a href="{}">Volver al perfil</a></div>"#,
                escape_html(&e.to_string()),
                PROFILE_PATH
            )),
        }
    });
    Ok(())
}

fn bind_submit(document: &Document, form: &Element, api: &ApiClient, mode: SaveMode) -> Result<(), JsValue> {
    let in_flight = Rc::new(Cell::new(false));
    let document = document.clone();
    let api = api.clone();
    let button = form
        .query_selector(r#"button[type="submit"]"#)?
        .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok());

    dom_utils::on(form, "submit", move |e| {
        e.prevent_default();
        if in_flight.get() {
            return;
        }
        let is_update = matches!(mode, SaveMode::Update(_));
        let payload = match validate_user_form(&read_form(&document), is_update) {
            Ok(payload) => payload,
            Err(e) => {
                toast::warning(&e.to_string());
                return;
            }
        };
        in_flight.set(true);
        dom_utils::set_busy(button.as_ref(), true);

        let api = api.clone();
        let mode = mode.clone();
        let in_flight = in_flight.clone();
        let button = button.clone();
        spawn_local(async move {
            let (result, done_message) = match &mode {
                SaveMode::Create => (api.create_user(&payload).await, CREATED_MESSAGE),
                SaveMode::Update(id) => (api.update_user(id, &payload).await, UPDATED_MESSAGE),
            };
            match result {
                Ok(()) => {
                    storage::save_alert_for_next_page(done_message, AlertKind::Success);
                    dom_utils::navigate(PROFILE_PATH);
                }
                Err(ClientError::Unauthorized) => auth::redirect_to_login(0),
                Err(e) => {
                    toast::show_alert(&e.to_string(), AlertKind::Danger);
                    in_flight.set(false);
                    dom_utils::set_busy(button.as_ref(), false);
                }
            }
        });
    })
}
