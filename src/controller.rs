//! Per-page owner of the chat state.
//!
//! Handlers close over a cloned [`ChatController`] instead of reaching for a
//! global.  `dispatch` releases the state borrow before running commands, so
//! a command that dispatches again (timers, futures) cannot double-borrow.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlInputElement, KeyboardEvent};

use crate::command_executors;
use crate::components::chat_view::ChatView;
use crate::constants::CHAT_PLACEHOLDER_NO_PROJECT;
use crate::dom_utils;
use crate::messages::Message;
use crate::models::Project;
use crate::network::ApiClient;
use crate::state::{ChatState, SelectedFile};
use crate::update::update;

struct Inner {
    state: RefCell<ChatState>,
    view: ChatView,
    api: ApiClient,
}

#[derive(Clone)]
pub struct ChatController {
    inner: Rc<Inner>,
}

impl ChatController {
    pub fn new(view: ChatView, api: ApiClient) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(ChatState::new()),
                view,
                api,
            }),
        }
    }

    pub fn view(&self) -> &ChatView {
        &self.inner.view
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn active_project(&self) -> Option<Project> {
        self.inner.state.borrow().active_project.clone()
    }

    pub fn dispatch(&self, msg: Message) {
        let mut commands = Vec::new();
        {
            let mut state = self.inner.state.borrow_mut();
            update(&mut state, msg, &mut commands);
        }
        for cmd in commands {
            command_executors::execute(self, cmd);
        }
    }

    /// Put the view in the "no project selected" state and wire the
    /// composer and the upload control.
    pub fn attach(&self) -> Result<(), JsValue> {
        let view = self.view();
        view.reset(true)?;
        view.apply_input_state(false, CHAT_PLACEHOLDER_NO_PROJECT);

        if let Some(button) = &view.send_button {
            let controller = self.clone();
            dom_utils::on(button, "click", move |e| {
                e.prevent_default();
                controller.submit_from_input();
            })?;
        }

        {
            let controller = self.clone();
            dom_utils::on(view.input.element(), "keydown", move |e| {
                let Some(key) = e.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if key.key() == "Enter" && !key.shift_key() {
                    e.prevent_default();
                    controller.submit_from_input();
                }
            })?;
        }

        if let (Some(button), Some(file_input)) = (&view.upload_button, &view.file_input) {
            let file_input = file_input.clone();
            dom_utils::on(button, "click", move |e| {
                e.prevent_default();
                file_input.click();
            })?;
        }

        if let Some(file_input) = &view.file_input {
            let controller = self.clone();
            dom_utils::on(file_input, "change", move |e| {
                let Some(input) = e
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                else {
                    return;
                };
                let Some(file) = input.files().and_then(|files| files.get(0)) else {
                    return;
                };
                controller.dispatch(Message::SbomFileChosen(SelectedFile {
                    name: file.name(),
                    size: file.size() as u64,
                    handle: Some(file),
                }));
            })?;
        }
        Ok(())
    }

    fn submit_from_input(&self) {
        let text = self.view().input.value();
        self.dispatch(Message::SubmitMessage(text));
    }
}
