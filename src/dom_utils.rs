//! dom_utils.rs – thin helper layer for repetitive DOM operations.
//!
//! Small wrappers for the show / hide / lookup patterns used by every page
//! so the components don't sprinkle `style` writes and casts everywhere.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, EventTarget, HtmlButtonElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, Window};

/// Remove the `hidden` class so the element becomes visible.
pub fn show(el: &Element) {
    let _ = el.class_list().remove_1("hidden");
    let _ = el.class_list().add_1("visible");
}

/// Hide the element by toggling CSS classes.
pub fn hide(el: &Element) {
    let _ = el.class_list().remove_1("visible");
    let _ = el.class_list().add_1("hidden");
}

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window exists"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("should have a document on window"))
}

/// `getElementById` + cast.  `None` when missing or of another type.
pub fn by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
}

/// Current value of an `<input>`, `<textarea>` or `<select>` by id, or an
/// empty string when the field is absent.
pub fn field_value(document: &Document, id: &str) -> String {
    let Some(el) = document.get_element_by_id(id) else {
        return String::new();
    };
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else {
        String::new()
    }
}

/// Checkbox state by id (`false` when absent).
pub fn checkbox_checked(document: &Document, id: &str) -> bool {
    by_id::<HtmlInputElement>(document, id)
        .map(|cb| cb.checked())
        .unwrap_or(false)
}

/// Disable a submit button and mark it `loading` while a request runs.
pub fn set_busy(button: Option<&HtmlButtonElement>, busy: bool) {
    let Some(button) = button else {
        return;
    };
    button.set_disabled(busy);
    let _ = button.class_list().toggle_with_force("loading", busy);
}

/// Attach a listener for the lifetime of the page.
pub fn on<F>(target: &EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

/// Navigate the current tab.
pub fn navigate(path: &str) {
    if let Ok(window) = window() {
        let _ = window.location().set_href(path);
    }
}

/// `window.confirm`, treating a missing window as "no".
pub fn confirm(message: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(message))
        .unwrap_or(false)
}
