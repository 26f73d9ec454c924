pub mod fleet;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Conditionally log messages based on tick interval when perf_stats feature is enabled.
///
/// This macro logs a message every 100 ticks. `$tick` is a plain `u64` tick
/// number. When the perf_stats feature is disabled, this macro compiles to
/// nothing and the arguments are never evaluated.
///
/// # Example
/// ```ignore
/// profile_log!(tick, "Tracked {} targets", grid.targets().len());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
