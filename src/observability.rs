//! This module provides lightweight diagnostics for the codec boundaries.
//!
//! Compression behavior is input-dependent (run structure decides whether a
//! sequence shrinks or grows), so the encode/decode entry points emit
//! structured counters that make a surprising output size explainable
//! without a debugger. The `log_metric!` macro is the primary tool.
//!
//! The `#[cfg(debug_assertions)]` attribute ensures the macro body and all
//! calls to it are compiled out of release builds entirely.

/// Logs a structured key-value metric line to stdout, only in debug builds.
///
/// # Example
/// ```
/// use tessera_codec::log_metric;
/// let runs = 7;
/// log_metric!("event"="rice_runs_encode", "runs"=&runs);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            let output = format!("TESSERA_METRIC: {{ {} }}", parts.join(", "));
            println!("{}", output);
        }
    };
}
