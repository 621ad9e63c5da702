use gloo_timers::callback::Timeout;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use crate::auth;
use crate::components::project_sidebar;
use crate::constants::DEFAULT_TOAST_DURATION_MS;
use crate::controller::ChatController;
use crate::error::ClientError;
use crate::messages::{Command, Message};
use crate::toast;
use crate::{error_log, warn_log};

/// Carry out one command produced by the chat reducer.
pub fn execute(controller: &ChatController, cmd: Command) {
    if let Err(e) = try_execute(controller, cmd) {
        error_log!("command failed: {:?}", e);
    }
}

fn try_execute(controller: &ChatController, cmd: Command) -> Result<(), JsValue> {
    let view = controller.view();
    match cmd {
        Command::SendMessageAfter { delay_ms, message } => {
            let controller = controller.clone();
            Timeout::new(delay_ms, move || controller.dispatch(*message)).forget();
        }

        Command::ResetView { welcome_visible } => view.reset(welcome_visible)?,
        Command::ApplyInputState { enabled, placeholder } => {
            view.apply_input_state(enabled, placeholder);
            if enabled {
                view.focus_input();
            }
        }
        Command::ShowProjectInfo(name) => view.show_project_info(name.as_deref()),
        Command::HighlightProject(project_id) => {
            let document = crate::dom_utils::document()?;
            project_sidebar::highlight_active(&document, project_id.as_deref());
        }
        Command::AppendEntry(entry) => view.append_entry(&entry)?,
        Command::ClearInput => view.clear_input(),
        Command::SetTyping(visible) => view.set_typing(visible)?,
        Command::ShowUploadProgress { .. } => view.show_upload_progress()?,
        Command::HideUploadProgress => view.hide_upload_progress(),
        Command::ResetFileInput => view.reset_file_input(),
        Command::ShowToast { message, kind } => {
            toast::show_toast(&message, kind, DEFAULT_TOAST_DURATION_MS)
        }

        Command::PostChatMessage { generation, request } => {
            let controller = controller.clone();
            spawn_local(async move {
                let result = controller.api().send_chat_message(&request).await;
                if let Err(e) = &result {
                    warn_log!("chat request failed: {}", e);
                }
                controller.dispatch(Message::ChatReplyReceived { generation, result });
            });
        }
        Command::UploadSbom {
            generation,
            file,
            fields,
        } => {
            let controller = controller.clone();
            spawn_local(async move {
                let result = match &file.handle {
                    Some(handle) => controller.api().upload_sbom(handle, &fields).await,
                    None => Err(ClientError::Validation(format!(
                        "El archivo {} ya no está disponible",
                        file.name
                    ))),
                };
                controller.dispatch(Message::SbomUploadFinished { generation, result });
            });
        }

        Command::RedirectToLogin { delay_ms } => auth::redirect_to_login(delay_ms),
    }
    Ok(())
}
