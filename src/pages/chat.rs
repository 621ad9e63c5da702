// src/pages/chat.rs
//
// Chat page: session check, then the controller and the project sidebar.

use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use crate::auth;
use crate::components::{ChatView, ProjectSidebar};
use crate::controller::ChatController;
use crate::dom_utils;
use crate::messages::Message;
use crate::network::ApiClient;
use crate::{debug_log, error_log};

pub fn mount(api: &ApiClient) -> Result<(), JsValue> {
    let api = api.clone();
    spawn_local(async move {
        if auth::require_session(&api).await.is_none() {
            return;
        }
        if let Err(e) = start(api) {
            error_log!("chat page failed to start: {:?}", e);
        }
    });
    Ok(())
}

fn start(api: ApiClient) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let view = ChatView::from_document(&document)?;
    let controller = ChatController::new(view, api.clone());
    controller.attach()?;

    let on_select = {
        let controller = controller.clone();
        move |project| controller.dispatch(Message::SelectProject(project))
    };
    let on_deleted = {
        let controller = controller.clone();
        move |id| controller.dispatch(Message::ProjectDeleted(id))
    };
    let sidebar = ProjectSidebar::new(&document, api, on_select, on_deleted)?;
    sidebar.load();
    debug_log!("chat page ready");
    Ok(())
}
