//! FILENAME: core/summary-engine/src/logging.rs
// PURPOSE: Category-tagged logging macros for the summary engine.
// CONTEXT: Same call shape as the application's log macros, but routed through
// the `log` facade so the embedding application owns sinks and formatting.

/// Log target prefix shared by every category.
pub const TARGET_PREFIX: &str = "summary_engine";

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $crate::logging::TARGET_PREFIX, "{}|{}", $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $crate::logging::TARGET_PREFIX, "{}|{}", $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $crate::logging::TARGET_PREFIX, "{}|{}", $cat, format_args!($($arg)*))
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        $crate::log_debug!($cat, "ENTER {}", $func)
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::log_debug!($cat, "ENTER {} {}", $func, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        $crate::log_debug!($cat, "EXIT {}", $func)
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::log_debug!($cat, "EXIT {} {}", $func, format_args!($($arg)*))
    };
}
