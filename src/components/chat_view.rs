//! DOM side of the chat page.
//!
//! `ChatView` caches the elements of the server-rendered chat template and
//! applies the view commands produced by the reducer.  It never decides
//! anything itself.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlInputElement, HtmlTextAreaElement};

use crate::constants::{SBOM_INDICATOR_TIMEOUT_MS, SBOM_PROCESSING_STEPS, SBOM_STEP_INTERVAL_MS};
use crate::dom_utils::{hide, show};
use crate::state::{ChatEntry, Role};
use crate::utils::escape_html;

pub const MESSAGES_ID: &str = "chat-messages";
pub const INPUT_ID: &str = "messageInput";
pub const SEND_BUTTON_ID: &str = "sendButton";
pub const WELCOME_ID: &str = "welcome-message";
pub const PROJECT_INFO_ID: &str = "project-info";
pub const UPLOAD_CONTROL_ID: &str = "sbom-upload";
pub const UPLOAD_BUTTON_ID: &str = "sbom-upload-btn";
pub const FILE_INPUT_ID: &str = "sbom-file-input";
const TYPING_ID: &str = "typing-indicator";
const PROGRESS_ID: &str = "sbom-progress";

/// The running step timer of the SBOM progress bubble, tagged with the
/// token of the bubble it animates.  Dropping the handle cancels it.
pub struct ProgressTimer<T> {
    token: Cell<u32>,
    handle: RefCell<Option<T>>,
}

impl<T> ProgressTimer<T> {
    pub fn new() -> Self {
        Self {
            token: Cell::new(0),
            handle: RefCell::new(None),
        }
    }

    /// Cancel any running timer and start tracking `handle` under a new token.
    pub fn arm(&self, handle: T) -> u32 {
        let token = self.bump();
        *self.handle.borrow_mut() = Some(handle);
        token
    }

    /// Cancel the running timer and invalidate every outstanding token.
    pub fn cancel(&self) {
        self.bump();
        self.handle.borrow_mut().take();
    }

    /// Self-clear for the bubble of `token`.  Returns whether it was still
    /// current; a newer bubble keeps its timer.
    pub fn expire(&self, token: u32) -> bool {
        if self.token.get() != token {
            return false;
        }
        self.handle.borrow_mut().take();
        true
    }

    pub fn is_running(&self) -> bool {
        self.handle.borrow().is_some()
    }

    fn bump(&self) -> u32 {
        let token = self.token.get().wrapping_add(1);
        self.token.set(token);
        token
    }
}

impl<T> Default for ProgressTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The composer may be a single-line input or a textarea depending on the
/// template.
#[derive(Clone)]
pub enum ChatInput {
    Input(HtmlInputElement),
    TextArea(HtmlTextAreaElement),
}

impl ChatInput {
    fn from_element(el: Element) -> Option<Self> {
        match el.dyn_into::<HtmlInputElement>() {
            Ok(input) => Some(ChatInput::Input(input)),
            Err(el) => el.dyn_into::<HtmlTextAreaElement>().ok().map(ChatInput::TextArea),
        }
    }

    pub fn value(&self) -> String {
        match self {
            ChatInput::Input(el) => el.value(),
            ChatInput::TextArea(el) => el.value(),
        }
    }

    pub fn clear(&self) {
        match self {
            ChatInput::Input(el) => el.set_value(""),
            ChatInput::TextArea(el) => el.set_value(""),
        }
    }

    fn set_enabled(&self, enabled: bool, placeholder: &str) {
        match self {
            ChatInput::Input(el) => {
                el.set_disabled(!enabled);
                el.set_placeholder(placeholder);
            }
            ChatInput::TextArea(el) => {
                el.set_disabled(!enabled);
                el.set_placeholder(placeholder);
            }
        }
    }

    pub fn element(&self) -> &Element {
        match self {
            ChatInput::Input(el) => el.unchecked_ref(),
            ChatInput::TextArea(el) => el.unchecked_ref(),
        }
    }
}

/// Wrapper class and inner markup of one bubble.
pub fn bubble_markup(entry: &ChatEntry) -> (&'static str, String) {
    let content = entry.html();
    let time = escape_html(&entry.time);
    match entry.role {
        Role::User => (
            "campo-usuario",
            format!(
                r#"<div class="mensaje-usuario"><div class="mensaje-contenido">{}</div><span class="mensaje-hora">{}</span></div><div class="icono-usuario"><i class="fas fa-user"></i></div>"#,
                content, time
            ),
        ),
        Role::Bot => (
            "campo-bot",
            format!(
                r#"<div class="icono-bot"><i class="fas fa-robot"></i></div><div class="mensaje-bot{}"><div class="mensaje-contenido">{}</div><span class="mensaje-hora">{}</span></div>"#,
                if entry.is_error { " mensaje-error" } else { "" },
                content,
                time
            ),
        ),
    }
}

pub struct ChatView {
    document: Document,
    pub messages: Element,
    pub input: ChatInput,
    pub send_button: Option<HtmlButtonElement>,
    pub upload_control: Option<Element>,
    pub upload_button: Option<Element>,
    pub file_input: Option<HtmlInputElement>,
    welcome: Option<Element>,
    project_info: Option<Element>,
    progress: Rc<ProgressTimer<Interval>>,
}

impl ChatView {
    /// Look up the chat template.  The message list and the composer are
    /// required; everything else is optional decoration.
    pub fn from_document(document: &Document) -> Result<Self, JsValue> {
        let messages = document
            .get_element_by_id(MESSAGES_ID)
            .ok_or_else(|| JsValue::from_str("#chat-messages not found"))?;
        let input = document
            .get_element_by_id(INPUT_ID)
            .and_then(ChatInput::from_element)
            .ok_or_else(|| JsValue::from_str("#messageInput not found or not a text field"))?;

        Ok(Self {
            document: document.clone(),
            messages,
            input,
            send_button: document
                .get_element_by_id(SEND_BUTTON_ID)
                .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok()),
            upload_control: document.get_element_by_id(UPLOAD_CONTROL_ID),
            upload_button: document.get_element_by_id(UPLOAD_BUTTON_ID),
            file_input: document
                .get_element_by_id(FILE_INPUT_ID)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok()),
            welcome: document.get_element_by_id(WELCOME_ID),
            project_info: document.get_element_by_id(PROJECT_INFO_ID),
            progress: Rc::new(ProgressTimer::new()),
        })
    }

    /// Remove every bubble and indicator, keeping only the welcome banner.
    pub fn reset(&self, welcome_visible: bool) -> Result<(), JsValue> {
        let children = self.messages.children();
        // Walk backwards: the collection is live.
        for i in (0..children.length()).rev() {
            if let Some(child) = children.item(i) {
                if Some(&child) != self.welcome.as_ref() {
                    child.remove();
                }
            }
        }
        self.progress.cancel();
        if let Some(welcome) = &self.welcome {
            if welcome_visible {
                show(welcome);
            } else {
                hide(welcome);
            }
        }
        Ok(())
    }

    pub fn apply_input_state(&self, enabled: bool, placeholder: &str) {
        self.input.set_enabled(enabled, placeholder);
        if let Some(btn) = &self.send_button {
            btn.set_disabled(!enabled);
        }
        if let Some(upload) = &self.upload_control {
            if enabled {
                show(upload);
            } else {
                hide(upload);
            }
        }
    }

    pub fn show_project_info(&self, project_name: Option<&str>) {
        let Some(info) = &self.project_info else {
            return;
        };
        match project_name {
            Some(name) => info.set_inner_html(&format!(
                r#"<div class="project-status"><i class="fas fa-folder"></i><span>Proyecto: {}</span></div>"#,
                escape_html(name)
            )),
            None => info.set_inner_html(""),
        }
    }

    pub fn append_entry(&self, entry: &ChatEntry) -> Result<(), JsValue> {
        let (class, inner) = bubble_markup(entry);
        let bubble = self.document.create_element("div")?;
        bubble.set_class_name(class);
        bubble.set_attribute("data-entry-id", &entry.id.to_string())?;
        bubble.set_inner_html(&inner);

        // Keep the indicators as the last children.
        let anchor = self
            .document
            .get_element_by_id(TYPING_ID)
            .or_else(|| self.document.get_element_by_id(PROGRESS_ID));
        match anchor {
            Some(anchor) => {
                self.messages.insert_before(&bubble, Some(&anchor))?;
            }
            None => {
                self.messages.append_child(&bubble)?;
            }
        }
        self.scroll_to_bottom();
        Ok(())
    }

    pub fn set_typing(&self, visible: bool) -> Result<(), JsValue> {
        let existing = self.document.get_element_by_id(TYPING_ID);
        match (visible, existing) {
            (true, None) => {
                let indicator = self.document.create_element("div")?;
                indicator.set_id(TYPING_ID);
                indicator.set_class_name("campo-bot typing-indicator");
                indicator.set_inner_html(
                    r#"<div class="icono-bot"><i class="fas fa-robot"></i></div><div class="mensaje-bot"><div class="typing-dots"><span></span><span></span><span></span></div></div>"#,
                );
                self.messages.append_child(&indicator)?;
                self.scroll_to_bottom();
            }
            (false, Some(indicator)) => indicator.remove(),
            _ => {}
        }
        Ok(())
    }

    /// Decorative "processing" bubble: cycles through the step labels and
    /// removes itself after a fixed time if no result arrived.
    pub fn show_upload_progress(&self) -> Result<(), JsValue> {
        self.hide_upload_progress();

        let indicator = self.document.create_element("div")?;
        indicator.set_id(PROGRESS_ID);
        indicator.set_class_name("campo-bot sbom-processing");
        indicator.set_inner_html(&format!(
            r#"<div class="icono-bot"><i class="fas fa-cog fa-spin"></i></div><div class="mensaje-bot"><div class="mensaje-contenido"><strong>Procesando SBOM</strong><div class="sbom-step">{}</div></div></div>"#,
            step_label(0)
        ));
        self.messages.append_child(&indicator)?;
        self.scroll_to_bottom();

        let step = Cell::new(0usize);
        let label = indicator.query_selector(".sbom-step")?;
        let interval = Interval::new(SBOM_STEP_INTERVAL_MS, move || {
            step.set((step.get() + 1) % SBOM_PROCESSING_STEPS.len());
            if let Some(label) = &label {
                label.set_text_content(Some(&step_label(step.get())));
            }
        });
        let token = self.progress.arm(interval);

        let progress = Rc::clone(&self.progress);
        Timeout::new(SBOM_INDICATOR_TIMEOUT_MS, move || {
            // Only the bubble this timeout was armed for may be removed.
            if progress.expire(token) {
                indicator.remove();
            }
        })
        .forget();
        Ok(())
    }

    pub fn hide_upload_progress(&self) {
        self.progress.cancel();
        if let Some(el) = self.document.get_element_by_id(PROGRESS_ID) {
            el.remove();
        }
    }

    pub fn clear_input(&self) {
        self.input.clear();
    }

    pub fn focus_input(&self) {
        if let Some(el) = self.input.element().dyn_ref::<web_sys::HtmlElement>() {
            let _ = el.focus();
        }
    }

    pub fn reset_file_input(&self) {
        if let Some(input) = &self.file_input {
            input.set_value("");
        }
    }

    pub fn scroll_to_bottom(&self) {
        self.messages.set_scroll_top(self.messages.scroll_height());
    }
}

fn step_label(step: usize) -> String {
    let label = SBOM_PROCESSING_STEPS[step % SBOM_PROCESSING_STEPS.len()];
    format!("{} ({}/{})...", label, step + 1, SBOM_PROCESSING_STEPS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::RenderMode;

    /// Counts how many handles were dropped (i.e. cancelled).
    struct Handle(Rc<Cell<u32>>);

    impl Drop for Handle {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn self_clear_stops_the_step_timer() {
        let dropped = Rc::new(Cell::new(0));
        let timer = ProgressTimer::new();
        let token = timer.arm(Handle(dropped.clone()));
        assert!(timer.is_running());

        assert!(timer.expire(token));
        assert!(!timer.is_running());
        assert_eq!(dropped.get(), 1);
    }

    #[test]
    fn stale_self_clear_leaves_newer_bubble_running() {
        let dropped = Rc::new(Cell::new(0));
        let timer = ProgressTimer::new();
        let first = timer.arm(Handle(dropped.clone()));
        timer.cancel();
        let second = timer.arm(Handle(dropped.clone()));

        assert!(!timer.expire(first));
        assert!(timer.is_running());
        assert_eq!(dropped.get(), 1);
        assert!(timer.expire(second));
        assert_eq!(dropped.get(), 2);
    }

    fn entry(role: Role, text: &str, mode: RenderMode, is_error: bool) -> ChatEntry {
        ChatEntry {
            id: 1,
            role,
            text: text.into(),
            mode,
            time: "10:30".into(),
            is_error,
            is_greeting: false,
        }
    }

    #[test]
    fn user_bubble_is_escaped() {
        let (class, html) = bubble_markup(&entry(Role::User, "<i>hola</i>", RenderMode::PlainEscaped, false));
        assert_eq!(class, "campo-usuario");
        assert!(html.contains("&lt;i&gt;hola&lt;/i&gt;"));
        assert!(html.contains("10:30"));
    }

    #[test]
    fn error_bubble_is_marked() {
        let (class, html) = bubble_markup(&entry(Role::Bot, "falló", RenderMode::PlainEscaped, true));
        assert_eq!(class, "campo-bot");
        assert!(html.contains("mensaje-bot mensaje-error"));
    }

    #[test]
    fn step_labels_cycle() {
        assert_eq!(step_label(0), "Leyendo archivo (1/4)...");
        assert!(step_label(3).starts_with("Buscando vulnerabilidades"));
    }
}
