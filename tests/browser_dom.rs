//! Browser tests for the DOM-facing helpers (`wasm-pack test --headless`).

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;
use web_sys::{Document, Element};

use devsec_assistant_frontend::components::chat_view::ChatView;
use devsec_assistant_frontend::markdown::RenderMode;
use devsec_assistant_frontend::state::{ChatEntry, Role};
use devsec_assistant_frontend::storage::{self, KeyValueStore};
use devsec_assistant_frontend::toast::{self, AlertKind};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn fixture(html: &str) -> Element {
    let doc = document();
    let root = doc.create_element("div").unwrap();
    root.set_inner_html(html);
    doc.body().unwrap().append_child(&root).unwrap();
    root
}

#[wasm_bindgen_test]
fn saved_alert_is_consumed_once() {
    let store = storage::session_storage().unwrap();
    storage::save_alert(&store, "Proyecto creado con éxito", AlertKind::Success).unwrap();

    assert_eq!(
        storage::take_saved_alert(&store).unwrap(),
        Some(("Proyecto creado con éxito".to_string(), AlertKind::Success))
    );
    assert_eq!(storage::take_saved_alert(&store).unwrap(), None);
    assert_eq!(KeyValueStore::get(&store, storage::ALERT_MESSAGE_KEY).unwrap(), None);
}

#[wasm_bindgen_test]
fn toast_creates_its_container() {
    toast::show_toast("hola <b>", AlertKind::Info, 60_000);
    let container = document().get_element_by_id("toast-container").unwrap();
    let html = container.inner_html();
    assert!(html.contains("hola &lt;b&gt;"));
    assert!(container.child_element_count() >= 1);
}

#[wasm_bindgen_test]
fn show_alert_prefers_inline_container() {
    let root = fixture(r#"<div id="container-alert"></div>"#);
    toast::show_alert("Por favor, completa todos los campos", AlertKind::Warning);
    let inline = document().get_element_by_id("container-alert").unwrap();
    assert!(inline.inner_html().contains("alert-warning"));
    root.remove();
}

#[wasm_bindgen_test]
fn bot_bubble_escapes_script() {
    let root = fixture(
        r#"<div id="chat-messages"><div id="welcome-message"></div></div>
<input id="messageInput"><button id="sendButton"></button>"#,
    );
    let view = ChatView::from_document(&document()).unwrap();
    view.append_entry(&ChatEntry {
        id: 1,
        role: Role::Bot,
        text: "<script>alert(1)</script>".into(),
        mode: RenderMode::TrustedMarkdown,
        time: "10:00".into(),
        is_error: false,
        is_greeting: false,
    })
    .unwrap();

    let messages = document().get_element_by_id("chat-messages").unwrap();
    assert!(messages.query_selector("script").unwrap().is_none());
    assert!(messages.inner_html().contains("&lt;script&gt;"));

    view.reset(true).unwrap();
    let children = messages.children();
    assert_eq!(children.length(), 1);
    assert_eq!(children.item(0).map(|c| c.id()), Some("welcome-message".to_string()));
    root.remove();
}
