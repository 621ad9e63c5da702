//! Scroll effects shared by every page.
//!
//! `[data-aos]` blocks fade in the first time they enter the viewport and the
//! main navbar gets a `scrolled` class once the page moves.

use js_sys::Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::constants::NAVBAR_SCROLLED_OFFSET_PX;
use crate::dom_utils;
use crate::{debug_log, warn_log};

pub const REVEAL_SELECTOR: &str = "[data-aos]";
pub const REVEALED_CLASS: &str = "aos-animate";
pub const NAVBAR_ID: &str = "navbar-principal";
pub const NAVBAR_SCROLLED_CLASS: &str = "scrolled";

const REVEAL_VISIBLE_RATIO: f64 = 0.1;

pub fn navbar_is_scrolled(scroll_y: f64) -> bool {
    scroll_y > NAVBAR_SCROLLED_OFFSET_PX
}

pub fn init() -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    observe_reveal_targets(&document)?;
    bind_navbar_scroll(&document)?;
    Ok(())
}

fn reveal_targets(document: &Document) -> Result<Vec<Element>, JsValue> {
    let nodes = document.query_selector_all(REVEAL_SELECTOR)?;
    Ok((0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|n| n.dyn_into::<Element>().ok())
        .collect())
}

fn observe_reveal_targets(document: &Document) -> Result<(), JsValue> {
    let targets = reveal_targets(document)?;
    if targets.is_empty() {
        return Ok(());
    }

    let callback = Closure::wrap(Box::new(|entries: Array, observer: IntersectionObserver| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if !entry.is_intersecting() {
                continue;
            }
            let target = entry.target();
            let _ = target.class_list().add_1(REVEALED_CLASS);
            observer.unobserve(&target);
        }
    }) as Box<dyn FnMut(Array, IntersectionObserver)>);

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(REVEAL_VISIBLE_RATIO));
    let observer = match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
        Ok(observer) => observer,
        Err(e) => {
            // No observer support: show everything straight away.
            warn_log!("IntersectionObserver unavailable: {:?}", e);
            for target in &targets {
                let _ = target.class_list().add_1(REVEALED_CLASS);
            }
            return Ok(());
        }
    };
    callback.forget();

    for target in &targets {
        observer.observe(target);
    }
    debug_log!("observing {} reveal targets", targets.len());
    Ok(())
}

fn bind_navbar_scroll(document: &Document) -> Result<(), JsValue> {
    let Some(navbar) = document.get_element_by_id(NAVBAR_ID) else {
        return Ok(());
    };
    let window = dom_utils::window()?;
    let win = window.clone();
    let update = move || {
        let scrolled = win.scroll_y().map(navbar_is_scrolled).unwrap_or(false);
        let _ = navbar.class_list().toggle_with_force(NAVBAR_SCROLLED_CLASS, scrolled);
    };
    update();
    dom_utils::on(&window, "scroll", move |_| update())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navbar_threshold_is_exclusive() {
        assert!(!navbar_is_scrolled(0.0));
        assert!(!navbar_is_scrolled(NAVBAR_SCROLLED_OFFSET_PX));
        assert!(navbar_is_scrolled(NAVBAR_SCROLLED_OFFSET_PX + 1.0));
    }
}
