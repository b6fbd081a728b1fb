//! Logging macros.

/// Evaluates the given expression and logs how long the evaluation took at
/// the `info` level.
#[macro_export]
macro_rules! with_timing_info_logging {
    ($message:expr $(,$arg:expr)*; $expression:expr) => {{
        let _start_time = ::std::time::Instant::now();
        let _result = $expression;
        let _duration = _start_time.elapsed();
        $crate::info!(
            concat!($message, " took {:.2} ms")$(,$arg)*,
            _duration.as_secs_f64() * 1e3,
        );
        _result
    }};
}

/// Evaluates the given expression and logs how long the evaluation took at
/// the `trace` level. Used for steps that are too frequent or too quick to
/// report at the `info` level.
#[macro_export]
macro_rules! with_trace_logging {
    ($message:expr $(,$arg:expr)*; $expression:expr) => {{
        let _start_time = ::std::time::Instant::now();
        let _result = $expression;
        $crate::trace!(
            concat!($message, " ({:.3} ms)")$(,$arg)*,
            _start_time.elapsed().as_secs_f64() * 1e3,
        );
        _result
    }};
}
