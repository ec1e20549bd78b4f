#![deny(missing_docs)]
//! Shared logging utilities for the collection filters workspace.
//!
//! This crate provides the `filters_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is tagged
//! with the render generation active on the emitting thread, so log output from
//! overlapping renders can be told apart.

use std::cell::Cell;

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Thread-local storage for the render generation being applied.
    static RENDER_GENERATION: Cell<u64> = const { Cell::new(0) };
}

/// Sets the render generation for the current thread.
/// The page state calls this whenever it issues or applies a render.
pub fn set_render_generation(generation: u64) {
    RENDER_GENERATION.with(|v| v.set(generation));
}

/// Retrieves the render generation for the current thread.
/// Returns 0 before the first render.
pub fn render_generation() -> u64 {
    RENDER_GENERATION.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current render generation.
#[macro_export]
macro_rules! filters_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("[r{}] {}", $crate::render_generation(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current render generation.
#[macro_export]
macro_rules! filters_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("[r{}] {}", $crate::render_generation(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current render generation.
#[macro_export]
macro_rules! filters_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("[r{}] {}", $crate::render_generation(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current render generation.
#[macro_export]
macro_rules! filters_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("[r{}] {}", $crate::render_generation(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current render generation.
#[macro_export]
macro_rules! filters_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("[r{}] {}", $crate::render_generation(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{render_generation, set_render_generation};

    #[test]
    fn generation_is_thread_local() {
        set_render_generation(7);
        assert_eq!(render_generation(), 7);
        let other = std::thread::spawn(render_generation).join().unwrap();
        assert_eq!(other, 0);
    }

    #[test]
    fn macros_expand_without_a_log_dependency() {
        super::initialize_for_tests();
        let section = "main";
        filters_debug!("section {section} requested");
        filters_info!("{} filters applied", 2);
    }
}
