//! Logging macros with deferred formatting.
//!
//! Each macro probes the logger's effective level first; the format
//! arguments are only evaluated when the call passes.
//!
//! # Examples
//!
//! ```
//! use rust_group_logger::prelude::*;
//! use rust_group_logger::info;
//!
//! let system = LoggingSystem::new();
//! system.configure(&FallbackConfigurator::new(Level::Info));
//! let logger = system.get_logger("server", "*", None, None).unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_group_logger::prelude::*;
/// # let system = LoggingSystem::new();
/// # system.configure(&FallbackConfigurator::new(Level::Info));
/// # let logger = system.get_logger("app", "*", None, None).unwrap();
/// use rust_group_logger::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(level, format!($($arg)+));
        }
    }};
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log a verbose-level message.
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Verbose, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_group_logger::prelude::*;
/// # let system = LoggingSystem::new();
/// # system.configure(&FallbackConfigurator::new(Level::Info));
/// # let logger = system.get_logger("app", "*", None, None).unwrap();
/// use rust_group_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a critical-level message.
///
/// # Examples
///
/// ```
/// # use rust_group_logger::prelude::*;
/// # let system = LoggingSystem::new();
/// # system.configure(&FallbackConfigurator::new(Level::Info));
/// # let logger = system.get_logger("app", "*", None, None).unwrap();
/// use rust_group_logger::critical;
/// critical!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Critical, $($arg)+)
    };
}
