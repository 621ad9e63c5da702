//! Toast / inline alert helper.
//!
//! Toasts live in a lazily created `#toast-container`; inline alerts replace
//! the contents of `#container-alert` when the page has one.  The timing
//! rules are kept in [`ToastLifecycle`], which has no DOM dependency.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, MouseEvent};

use crate::constants::{DEFAULT_TOAST_DURATION_MS, TOAST_FADE_MS, TOAST_RESUME_MS};
use crate::error_log;
use crate::utils::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Danger,
    Warning,
    Info,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Danger => "danger",
            AlertKind::Warning => "warning",
            AlertKind::Info => "info",
        }
    }

    /// Unknown categories render as `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "success" => AlertKind::Success,
            "danger" | "error" => AlertKind::Danger,
            "warning" => AlertKind::Warning,
            _ => AlertKind::Info,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::Success => "Éxito",
            AlertKind::Danger => "Error",
            AlertKind::Warning => "Advertencia",
            AlertKind::Info => "Información",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            AlertKind::Success => "fas fa-check-circle",
            AlertKind::Danger => "fas fa-exclamation-circle",
            AlertKind::Warning => "fas fa-exclamation-triangle",
            AlertKind::Info => "fas fa-info-circle",
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// A scheduled removal check.  Only the most recent ticket can remove the
/// toast; older tickets are ignored when they fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTicket {
    pub id: u32,
    pub delay_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Counting { remove_at: f64, ticket: u32 },
    Paused,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Remove,
    /// Fired before the deadline; check again after this many ms.
    Reschedule(TimerTicket),
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToastLifecycle {
    phase: Phase,
    next_ticket: u32,
}

impl ToastLifecycle {
    /// Start counting down `duration_ms` from `now`.
    pub fn start(now: f64, duration_ms: u32) -> (Self, TimerTicket) {
        let mut lifecycle = Self {
            phase: Phase::Paused,
            next_ticket: 0,
        };
        let ticket = lifecycle.count_down(now, duration_ms);
        (lifecycle, ticket)
    }

    fn count_down(&mut self, now: f64, delay_ms: u32) -> TimerTicket {
        self.next_ticket += 1;
        let ticket = TimerTicket {
            id: self.next_ticket,
            delay_ms,
        };
        self.phase = Phase::Counting {
            remove_at: now + f64::from(delay_ms),
            ticket: ticket.id,
        };
        ticket
    }

    pub fn pointer_enter(&mut self) {
        if self.phase != Phase::Dismissed {
            self.phase = Phase::Paused;
        }
    }

    /// Leaving restarts the countdown at the fixed resume delay.
    pub fn pointer_leave(&mut self, now: f64) -> Option<TimerTicket> {
        match self.phase {
            Phase::Paused => Some(self.count_down(now, TOAST_RESUME_MS)),
            _ => None,
        }
    }

    /// Explicit close.  Returns `false` if the toast was already gone.
    pub fn dismiss(&mut self) -> bool {
        let was_live = self.phase != Phase::Dismissed;
        self.phase = Phase::Dismissed;
        was_live
    }

    pub fn timer_fired(&mut self, ticket: u32, now: f64) -> TimerOutcome {
        match self.phase {
            Phase::Counting { remove_at, ticket: current } if current == ticket => {
                if now >= remove_at {
                    self.phase = Phase::Dismissed;
                    TimerOutcome::Remove
                } else {
                    let remaining = (remove_at - now).ceil() as u32;
                    TimerOutcome::Reschedule(self.count_down(now, remaining))
                }
            }
            _ => TimerOutcome::Ignore,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_dismissed(&self) -> bool {
        self.phase == Phase::Dismissed
    }
}

// ---------------------------------------------------------------------------
// DOM
// ---------------------------------------------------------------------------

/// Inline banner when the page has `#container-alert` and is not in a
/// redirect transition, otherwise a toast.
pub fn show_alert(message: &str, kind: AlertKind) {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return,
    };
    let document = match window.document() {
        Some(d) => d,
        None => return,
    };
    let redirecting = window
        .location()
        .hash()
        .map(|h| h == "#redirect")
        .unwrap_or(false);

    match document.get_element_by_id("container-alert") {
        Some(container) if !redirecting => container.set_inner_html(&format!(
            r#"<div class="alert alert-dismissible alert-{kind} mt-3">
    <button type="button" class="btn-close" data-bs-dismiss="alert"></button>
    <h4 class="alert-heading">{title}</h4>
    <p class="mb-0">{message}</p>
</div>"#,
            kind = kind.as_str(),
            title = kind.title(),
            message = escape_html(message),
        )),
        _ => show_toast(message, kind, DEFAULT_TOAST_DURATION_MS),
    }
}

pub fn success(message: &str) {
    show_toast(message, AlertKind::Success, DEFAULT_TOAST_DURATION_MS);
}

pub fn warning(message: &str) {
    show_toast(message, AlertKind::Warning, DEFAULT_TOAST_DURATION_MS);
}

pub fn error(message: &str) {
    show_toast(message, AlertKind::Danger, DEFAULT_TOAST_DURATION_MS);
}

pub fn show_toast(message: &str, kind: AlertKind, duration_ms: u32) {
    if let Err(e) = try_show_toast(message, kind, duration_ms) {
        error_log!("toast failed: {:?}", e);
    }
}

#[derive(Clone)]
struct ToastHandle {
    element: Element,
    lifecycle: Rc<RefCell<ToastLifecycle>>,
}

impl ToastHandle {
    fn arm(&self, ticket: TimerTicket) {
        let handle = self.clone();
        Timeout::new(ticket.delay_ms, move || handle.on_timer(ticket.id)).forget();
    }

    fn on_timer(&self, ticket: u32) {
        let outcome = self
            .lifecycle
            .borrow_mut()
            .timer_fired(ticket, js_sys::Date::now());
        match outcome {
            TimerOutcome::Remove => fade_out(&self.element),
            TimerOutcome::Reschedule(next) => self.arm(next),
            TimerOutcome::Ignore => {}
        }
    }

    fn close(&self) {
        if self.lifecycle.borrow_mut().dismiss() {
            fade_out(&self.element);
        }
    }
}

fn try_show_toast(message: &str, kind: AlertKind, duration_ms: u32) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let container = ensure_container(&document)?;

    let toast = document.create_element("div")?;
    toast.set_id(&format!("toast-{}", uuid::Uuid::new_v4()));
    toast.set_class_name(&format!("toast-item toast-{}", kind.as_str()));
    toast.set_inner_html(&format!(
        r#"<div class="toast-content">
    <div class="toast-icon"><i class="{icon}"></i></div>
    <div class="toast-body">
        <div class="toast-title">{title}</div>
        <div class="toast-message">{message}</div>
    </div>
    <button class="toast-close" type="button" aria-label="Cerrar"><i class="fas fa-times"></i></button>
</div>
<div class="toast-progress"><div class="toast-progress-bar"></div></div>"#,
        icon = kind.icon(),
        title = kind.title(),
        message = escape_html(message),
    ));
    container.append_child(&toast)?;

    let enter = toast.clone();
    Timeout::new(10, move || {
        let _ = enter.class_list().add_1("toast-show");
    })
    .forget();

    let progress = toast
        .query_selector(".toast-progress-bar")?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok());
    if let Some(bar) = &progress {
        bar.style()
            .set_property("animation-duration", &format!("{}ms", duration_ms))?;
        bar.class_list().add_1("toast-progress-active")?;
    }

    let (lifecycle, ticket) = ToastLifecycle::start(js_sys::Date::now(), duration_ms);
    let handle = ToastHandle {
        element: toast.clone(),
        lifecycle: Rc::new(RefCell::new(lifecycle)),
    };
    handle.arm(ticket);

    {
        let handle = handle.clone();
        let bar = progress.clone();
        let cb = Closure::wrap(Box::new(move |_e: MouseEvent| {
            handle.lifecycle.borrow_mut().pointer_enter();
            if let Some(bar) = &bar {
                let _ = bar.style().set_property("animation-play-state", "paused");
            }
        }) as Box<dyn FnMut(_)>);
        toast.add_event_listener_with_callback("mouseenter", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    {
        let handle = handle.clone();
        let bar = progress;
        let cb = Closure::wrap(Box::new(move |_e: MouseEvent| {
            let ticket = handle.lifecycle.borrow_mut().pointer_leave(js_sys::Date::now());
            if let Some(bar) = &bar {
                let _ = bar.style().set_property("animation-play-state", "running");
            }
            if let Some(ticket) = ticket {
                handle.arm(ticket);
            }
        }) as Box<dyn FnMut(_)>);
        toast.add_event_listener_with_callback("mouseleave", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    // Close button and a click anywhere on the toast both dismiss it.
    {
        let handle = handle.clone();
        let cb = Closure::wrap(Box::new(move |_e: MouseEvent| {
            handle.close();
        }) as Box<dyn FnMut(_)>);
        toast.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    Ok(())
}

fn ensure_container(document: &Document) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id("toast-container") {
        return Ok(el);
    }
    let container = document.create_element("div")?;
    container.set_id("toast-container");
    container.set_class_name("toast-container");
    document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(&container)?;
    Ok(container)
}

fn fade_out(toast: &Element) {
    let _ = toast.class_list().add_1("toast-hide");
    let toast = toast.clone();
    Timeout::new(TOAST_FADE_MS, move || {
        let parent = toast.parent_element();
        toast.remove();
        if let Some(container) = parent {
            if container.child_element_count() == 0 {
                container.remove();
            }
        }
    })
    .forget();
}
