//! Small crate-wide convenience macros.
//!
//! The logging macros forward to the browser console.  Off-wasm (native unit
//! tests) they compile to nothing at runtime, because calling an imported JS
//! function outside the browser aborts the test binary.

/// Console log that only fires in debug builds.
///
/// ```rust,ignore
/// debug_log!("selected project {}", id);
/// ```
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        if cfg!(all(debug_assertions, target_arch = "wasm32")) {
            web_sys::console::log_1(&format!($($arg)*).into());
        }
    };
}

/// `console.warn` with `format!` arguments.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            web_sys::console::warn_1(&format!($($arg)*).into());
        }
    };
}

/// `console.error` with `format!` arguments.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            web_sys::console::error_1(&format!($($arg)*).into());
        }
    };
}
