// Extra timer logging
#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        // Nothing
    };
}

// SSA LOADING MACROS
#[macro_export]
#[cfg(feature = "show_ssa")]
macro_rules! ssa_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_ssa"))]
macro_rules! ssa_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// ERROR TRACER LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_trace")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_trace"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
