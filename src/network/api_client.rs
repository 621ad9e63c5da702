use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Headers, Request, RequestCredentials, RequestInit, RequestMode, Response};

use super::config::ApiConfig;
use crate::error::ClientError;
use crate::models::{
    ChatReply, ChatRequest, LoginRequest, LoginResponse, Project, ProjectPayload, RoleResponse,
    SbomUploadReply, User, UserPayload,
};
use crate::{debug_log, warn_log};

/// Which of the two backends a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Users, projects and authentication.
    General,
    /// Chat messages and SBOM uploads.
    Chat,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(String),
    /// The browser sets the multipart boundary itself, so no JSON
    /// `Content-Type` default is added for this variant.
    Multipart(FormData),
}

impl RequestBody {
    fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: String,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: "GET".to_string(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: "DELETE".to_string(),
            ..Self::get()
        }
    }

    /// `POST` without a body (logout).
    pub fn post_empty() -> Self {
        Self {
            method: "POST".to_string(),
            ..Self::get()
        }
    }

    pub fn post_json<T: Serialize>(payload: &T) -> Result<Self, ClientError> {
        Self::json("POST", payload)
    }

    pub fn put_json<T: Serialize>(payload: &T) -> Result<Self, ClientError> {
        Self::json("PUT", payload)
    }

    pub fn multipart(form: FormData) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(RequestBody::Multipart(form)),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn json<T: Serialize>(method: &str, payload: &T) -> Result<Self, ClientError> {
        Ok(Self {
            method: method.to_string(),
            body: Some(RequestBody::Json(serde_json::to_string(payload)?)),
            headers: Vec::new(),
        })
    }
}

/// Merge the JSON default header with the caller's headers.  Header names
/// compare case-insensitively and the caller's value wins.
pub fn merge_headers(caller: &[(String, String)], multipart: bool) -> Vec<(String, String)> {
    let mut merged = Vec::with_capacity(caller.len() + 1);
    let overrides_content_type = caller
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
    if !multipart && !overrides_content_type {
        merged.push(("Content-Type".to_string(), "application/json".to_string()));
    }
    for (name, value) in caller {
        merged.retain(|(existing, _): &(String, String)| !existing.eq_ignore_ascii_case(name));
        merged.push((name.clone(), value.clone()));
    }
    merged
}

/// Human-readable message for a failed response: the `error`, `message` or
/// `detail` key of a JSON body, else the status line.
pub fn backend_error_message(status: u16, body: &str, status_text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message", "detail"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| {
            if status_text.is_empty() {
                format!("Error {}", status)
            } else {
                format!("Error {}: {}", status, status_text)
            }
        })
}

/// Map a non-2xx status into the error taxonomy.
pub fn error_for_status(status: u16, body: &str, status_text: &str) -> ClientError {
    if status == 401 {
        ClientError::Unauthorized
    } else {
        ClientError::Backend {
            status,
            message: backend_error_message(status, body, status_text),
        }
    }
}

/// A successful login may come back with an empty body; anything else has
/// to be a valid [`LoginResponse`].
pub(crate) fn parse_login_body(text: &str) -> Result<LoginResponse, ClientError> {
    if text.trim().is_empty() {
        return Ok(LoginResponse::default());
    }
    Ok(serde_json::from_str(text)?)
}

/// REST client for the general and chat backends.
///
/// Every request is sent with `credentials: include` so the session cookie
/// travels cross-origin.  Cloning is cheap (the config is shared).
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Rc<ApiConfig>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Single best-effort request.  Status codes are left to the caller; only
    /// a rejected `fetch` becomes an error here.
    pub async fn fetch_with_credentials(
        &self,
        backend: Backend,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        let url = self.config.url(backend, path);

        let opts = RequestInit::new();
        opts.set_method(&options.method);
        opts.set_mode(RequestMode::Cors);
        opts.set_credentials(RequestCredentials::Include);

        let multipart = options.body.as_ref().is_some_and(RequestBody::is_multipart);
        let headers = Headers::new()?;
        for (name, value) in merge_headers(&options.headers, multipart) {
            headers.append(&name, &value)?;
        }
        opts.set_headers(&headers);

        match &options.body {
            Some(RequestBody::Json(data)) => opts.set_body(&JsValue::from_str(data)),
            Some(RequestBody::Multipart(form)) => opts.set_body(form),
            None => {}
        }

        let request = Request::new_with_str_and_init(&url, &opts)?;
        let window = web_sys::window()
            .ok_or_else(|| ClientError::Environment("no global window exists".into()))?;

        debug_log!("{} {}", options.method, url);
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;
        Ok(resp)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let resp = self.fetch_with_credentials(backend, path, options).await?;
        let text = read_text(&resp).await?;
        if !resp.ok() {
            return Err(error_for_status(resp.status(), &text, &resp.status_text()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn request_ok(
        &self,
        backend: Backend,
        path: &str,
        options: RequestOptions,
    ) -> Result<(), ClientError> {
        let resp = self.fetch_with_credentials(backend, path, options).await?;
        if resp.ok() {
            return Ok(());
        }
        let text = read_text(&resp).await.unwrap_or_default();
        Err(error_for_status(resp.status(), &text, &resp.status_text()))
    }

    // -------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------

    /// `GET /usuarios/rol`, bypassing the HTTP cache.  Any failure means
    /// "not authenticated".
    pub async fn fetch_roles(&self) -> Result<Vec<String>, ClientError> {
        let options = RequestOptions::get().with_header("Cache-Control", "no-cache");
        let resp: RoleResponse = self
            .request_json(Backend::General, "/usuarios/rol", options)
            .await
            .map_err(|e| match e {
                ClientError::Network(_) => e,
                _ => ClientError::Unauthorized,
            })?;
        Ok(resp.rol)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest { username, password };
        let resp = self
            .fetch_with_credentials(Backend::General, "/login", RequestOptions::post_json(&body)?)
            .await?;
        let text = read_text(&resp).await?;
        if !resp.ok() {
            // A 401 here means bad credentials, not an expired session.
            return Err(ClientError::Backend {
                status: resp.status(),
                message: backend_error_message(resp.status(), &text, &resp.status_text()),
            });
        }
        parse_login_body(&text)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.request_ok(Backend::General, "/logout", RequestOptions::post_empty())
            .await
    }

    // -------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.request_json(Backend::General, "/proyectos", RequestOptions::get())
            .await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, ClientError> {
        self.request_json(Backend::General, &format!("/proyectos/{}", id), RequestOptions::get())
            .await
    }

    pub async fn create_project(&self, payload: &ProjectPayload) -> Result<(), ClientError> {
        self.request_ok(Backend::General, "/proyectos", RequestOptions::post_json(payload)?)
            .await
    }

    pub async fn update_project(&self, id: &str, payload: &ProjectPayload) -> Result<(), ClientError> {
        self.request_ok(
            Backend::General,
            &format!("/proyectos/{}", id),
            RequestOptions::put_json(payload)?,
        )
        .await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), ClientError> {
        self.request_ok(Backend::General, &format!("/proyectos/{}", id), RequestOptions::delete())
            .await
    }

    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.request_json(Backend::General, "/usuarios", RequestOptions::get())
            .await
    }

    /// `GET /perfil`: the account behind the session cookie.
    pub async fn get_profile(&self) -> Result<User, ClientError> {
        self.request_json(Backend::General, "/perfil", RequestOptions::get())
            .await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ClientError> {
        self.request_json(Backend::General, &format!("/usuarios/{}", id), RequestOptions::get())
            .await
    }

    pub async fn create_user(&self, payload: &UserPayload) -> Result<(), ClientError> {
        self.request_ok(Backend::General, "/usuarios", RequestOptions::post_json(payload)?)
            .await
    }

    pub async fn update_user(&self, id: &str, payload: &UserPayload) -> Result<(), ClientError> {
        self.request_ok(
            Backend::General,
            &format!("/usuarios/{}", id),
            RequestOptions::put_json(payload)?,
        )
        .await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        self.request_ok(Backend::General, &format!("/usuarios/{}", id), RequestOptions::delete())
            .await
    }

    // -------------------------------------------------------------------
    // Chat
    // -------------------------------------------------------------------

    pub async fn send_chat_message(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        self.request_json(Backend::Chat, "/chat/mensajes", RequestOptions::post_json(request)?)
            .await
    }

    /// Multipart upload of an SBOM file together with the project's
    /// analysis settings.
    pub async fn upload_sbom(
        &self,
        file: &web_sys::File,
        fields: &[(&str, String)],
    ) -> Result<SbomUploadReply, ClientError> {
        let form = FormData::new()?;
        form.append_with_blob_and_filename("file", file, &file.name())?;
        for (name, value) in fields {
            form.append_with_str(name, value)?;
        }
        self.request_json(Backend::Chat, "/chat/upload-sbom", RequestOptions::multipart(form))
            .await
    }
}

async fn read_text(resp: &Response) -> Result<String, ClientError> {
    let text = JsFuture::from(resp.text()?).await?;
    match text.as_string() {
        Some(body) => Ok(body),
        None => {
            warn_log!("response body was not text (status {})", resp.status());
            Ok(String::new())
        }
    }
}
