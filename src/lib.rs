/// Status line macro. Emits an `info` event with the prefix as a field.
///
/// Usage:
/// ```ignore
/// log_status!("ratio", "TypeScript = {:.4}", ratio);
/// log_status!("conversions", "{} file(s) converted", count);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        ::tracing::info!(prefix = $prefix, "{}", format_args!($($arg)*))
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `tsgauge::config` instead of `tsgauge::core::config`
pub use self::core::*;
pub use utils::*;
