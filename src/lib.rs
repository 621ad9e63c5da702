use wasm_bindgen::prelude::*;

#[macro_use]
mod macros;

pub mod animations;
pub mod auth;
pub mod command_executors;
pub mod components;
pub mod constants; // URLs, routes, timings and limits
pub mod controller;
pub mod dom_utils;
pub mod error;
pub mod markdown;
pub mod messages; // Message / Command enums of the chat page
pub mod models;
pub mod network;
pub mod pages;
pub mod sbom;
pub mod state;
pub mod storage;
pub mod toast;
pub mod update; // Pure chat reducer
pub mod utils;

use network::{ApiClient, ApiConfig};
use pages::PageKind;

// Main entry point for the WASM module
#[wasm_bindgen(start)]
pub fn start() {
    // Initialize better panic messages
    console_error_panic_hook::set_once();
}

/// Initialise the page named by `kind` against the build-time backend URLs.
#[wasm_bindgen]
pub fn init_page(kind: &str, resource_id: Option<String>) -> Result<(), JsValue> {
    boot(kind, resource_id, ApiConfig::from_env())
}

/// Same as [`init_page`] with backend URLs supplied by the host page.
#[wasm_bindgen]
pub fn init_page_with_api(
    kind: &str,
    resource_id: Option<String>,
    api_url: &str,
    chat_url: &str,
) -> Result<(), JsValue> {
    boot(kind, resource_id, ApiConfig::from_urls(api_url, chat_url))
}

fn boot(kind: &str, resource_id: Option<String>, config: ApiConfig) -> Result<(), JsValue> {
    let kind: PageKind = kind.parse().map_err(|e: String| JsValue::from_str(&e))?;
    debug_log!("init page {} (resource {:?})", kind, resource_id);
    let api = ApiClient::new(config);

    // Shared by every page.
    storage::show_saved_alert();
    auth::bind_logout_link(&api)?;
    if let Err(e) = animations::init() {
        warn_log!("scroll effects disabled: {:?}", e);
    }

    pages::init(kind, resource_id, &api)
}
