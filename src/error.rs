//! Domain error type shared by the network layer and the controllers.
//!
//! DOM plumbing keeps returning `Result<_, JsValue>`; everything that talks
//! to the backend or validates user input returns [`ClientError`] so callers
//! can branch on the failure class (connectivity, session, validation,
//! backend-reported).

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// `fetch` rejected before a response arrived.
    #[error("Error de conexión: {0}")]
    Network(String),

    /// 401 from any endpoint, or a failed role probe.
    #[error("Sesión expirada")]
    Unauthorized,

    /// Non-2xx with an application error message.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// 2xx whose body did not match the expected shape.
    #[error("Respuesta inválida del servidor: {0}")]
    Decode(String),

    /// Rejected client-side before any request was made.
    #[error("{0}")]
    Validation(String),

    /// A DOM or JS exception that is not a failed request.
    #[error("Error del navegador: {0}")]
    Js(String),

    /// `window`, `document` or storage missing.
    #[error("Entorno del navegador no disponible: {0}")]
    Environment(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

/// `fetch` rejects with a `TypeError` (or `AbortError` when cancelled);
/// every other exception name comes from DOM or JS plumbing.
pub fn classify_js_error(name: Option<&str>, detail: String) -> ClientError {
    match name {
        Some("TypeError") | Some("AbortError") | Some("NetworkError") => ClientError::Network(detail),
        _ => ClientError::Js(detail),
    }
}

fn js_string_prop(value: &JsValue, prop: &str) -> Option<String> {
    js_sys::Reflect::get(value, &JsValue::from_str(prop))
        .ok()
        .and_then(|v| v.as_string())
}

impl From<JsValue> for ClientError {
    fn from(value: JsValue) -> Self {
        if let Some(text) = value.as_string() {
            return ClientError::Js(text);
        }
        let name = js_string_prop(&value, "name");
        let detail = js_string_prop(&value, "message").unwrap_or_else(|| format!("{:?}", value));
        classify_js_error(name.as_deref(), detail)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<ClientError> for JsValue {
    fn from(err: ClientError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_displays_message_verbatim() {
        let err = ClientError::Backend {
            status: 409,
            message: "El proyecto ya existe".into(),
        };
        assert_eq!(err.to_string(), "El proyecto ya existe");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn only_fetch_rejections_count_as_network() {
        assert_eq!(
            classify_js_error(Some("TypeError"), "Failed to fetch".into()),
            ClientError::Network("Failed to fetch".into())
        );
        assert_eq!(
            classify_js_error(Some("HierarchyRequestError"), "bad node".into()),
            ClientError::Js("bad node".into())
        );
        assert!(matches!(classify_js_error(None, "x".into()), ClientError::Js(_)));
    }

    #[test]
    fn decode_errors_convert_from_serde() {
        let err: ClientError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
