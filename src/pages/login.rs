// src/pages/login.rs
//
// Login form: `POST /login`, then back to wherever the user was sent from.

use std::cell::Cell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlButtonElement, HtmlInputElement, KeyboardEvent};

use crate::constants::{LOGIN_SUCCESS_REDIRECT_MS, PROFILE_PATH};
use crate::dom_utils;
use crate::error::ClientError;
use crate::network::ApiClient;
use crate::storage;
use crate::toast::{self, AlertKind};
use crate::{debug_log, warn_log};

const FORM_ID: &str = "login-form";
const USERNAME_ID: &str = "username";
const PASSWORD_ID: &str = "password";

pub const MISSING_FIELDS_MESSAGE: &str = "Por favor, completa todos los campos";
pub const WELCOME_MESSAGE: &str = "¡Bienvenido! Redirigiendo...";

/// Username is trimmed, the password is taken as typed.
pub fn login_fields(username: &str, password: &str) -> Result<(String, String), ClientError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ClientError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
    }
    Ok((username.to_string(), password.to_string()))
}

pub fn mount(api: &ApiClient) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let Some(form) = document.get_element_by_id(FORM_ID) else {
        warn_log!("login page without #{}", FORM_ID);
        return Ok(());
    };

    let in_flight = Rc::new(Cell::new(false));
    let submit = {
        let api = api.clone();
        let document = document.clone();
        Rc::new(move || submit_login(&document, &api, in_flight.clone()))
    };

    {
        let submit = submit.clone();
        dom_utils::on(&form, "submit", move |e| {
            e.prevent_default();
            submit();
        })?;
    }

    for id in [USERNAME_ID, PASSWORD_ID] {
        let Some(field) = document.get_element_by_id(id) else {
            continue;
        };
        let submit = submit.clone();
        dom_utils::on(&field, "keydown", move |e| {
            if e.dyn_ref::<KeyboardEvent>().map(|k| k.key()) == Some("Enter".to_string()) {
                e.prevent_default();
                submit();
            }
        })?;
    }

    bind_password_toggle(&document)?;
    Ok(())
}

fn submit_login(document: &Document, api: &ApiClient, in_flight: Rc<Cell<bool>>) {
    if in_flight.get() {
        return;
    }
    let fields = login_fields(
        &dom_utils::field_value(document, USERNAME_ID),
        &dom_utils::field_value(document, PASSWORD_ID),
    );
    let (username, password) = match fields {
        Ok(fields) => fields,
        Err(e) => {
            toast::show_alert(&e.to_string(), AlertKind::Warning);
            return;
        }
    };

    let button = login_button(document);
    dom_utils::set_busy(button.as_ref(), true);
    in_flight.set(true);

    let api = api.clone();
    spawn_local(async move {
        match api.login(&username, &password).await {
            Ok(reply) => {
                let name = reply.username.unwrap_or(username);
                debug_log!("logged in as {}", name);
                let target = match storage::session_storage() {
                    Ok(store) => {
                        if let Err(e) = storage::cache_username(&store, &name) {
                            warn_log!("could not cache username: {:?}", e);
                        }
                        storage::take_redirect_after_login(&store)
                    }
                    Err(_) => None,
                }
                .unwrap_or_else(|| PROFILE_PATH.to_string());
                toast::show_alert(WELCOME_MESSAGE, AlertKind::Success);
                TimeoutFuture::new(LOGIN_SUCCESS_REDIRECT_MS).await;
                dom_utils::navigate(&target);
            }
            Err(e) => {
                warn_log!("login failed: {}", e);
                toast::show_alert(&e.to_string(), AlertKind::Danger);
                dom_utils::set_busy(button.as_ref(), false);
                in_flight.set(false);
            }
        }
    });
}

fn login_button(document: &Document) -> Option<HtmlButtonElement> {
    document
        .query_selector(".login-btn")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
}

/// Eye button next to the password field switches it between hidden and
/// plain text.
fn bind_password_toggle(document: &Document) -> Result<(), JsValue> {
    let (Some(toggle), Some(field)) = (
        document.query_selector(".password-toggle")?,
        dom_utils::by_id::<HtmlInputElement>(document, PASSWORD_ID),
    ) else {
        return Ok(());
    };
    let icon = toggle.query_selector("i")?;
    dom_utils::on(&toggle, "click", move |e| {
        e.prevent_default();
        let reveal = field.type_() == "password";
        field.set_type(if reveal { "text" } else { "password" });
        if let Some(icon) = &icon {
            let classes = icon.class_list();
            let _ = classes.toggle_with_force("fa-eye", !reveal);
            let _ = classes.toggle_with_force("fa-eye-slash", reveal);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        for (user, pass) in [("", "secret"), ("   ", "secret"), ("ana", "")] {
            assert_eq!(
                login_fields(user, pass),
                Err(ClientError::Validation(MISSING_FIELDS_MESSAGE.into()))
            );
        }
    }

    #[test]
    fn username_is_trimmed_password_is_not() {
        assert_eq!(
            login_fields("  ana ", " pw "),
            Ok(("ana".to_string(), " pw ".to_string()))
        );
    }
}
