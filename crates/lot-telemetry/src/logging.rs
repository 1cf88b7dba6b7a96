//! Structured logging helpers.
//!
//! Every ledger log line carries the same fields so the JSON output can be
//! filtered per lot:
//! - `component`: emitting component (ledger, service, bus, notifier)
//! - `lot_id`: lot the line is about
//! - Additional context fields

/// Log an event with a component field.
#[macro_export]
macro_rules! log_event {
    // Info level with component
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with component
    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with component
    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with component
    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a lot-related event with standard fields.
#[macro_export]
macro_rules! log_lot_event {
    ($level:ident, $component:expr, $msg:expr, $lot_id:expr, $caller:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            lot_id = %$lot_id,
            caller = %$caller,
            $($($field)*,)?
            $msg
        )
    };
}
