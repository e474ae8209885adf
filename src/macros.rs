//! Logging macros with `format!`-style arguments.
//!
//! # Examples
//!
//! ```
//! use logtee::prelude::*;
//! use logtee::info;
//! use logtee::sinks::MemorySink;
//! use std::sync::Arc;
//!
//! let out = MemorySink::new();
//! let logger = LoggerBuilder::new(Config::default())
//!     .console_sink(Arc::new(out.clone()))
//!     .build()
//!     .unwrap();
//!
//! let port = 8080;
//! info!(logger, "listening on port {}", port);
//! assert!(out.contents_string().contains("listening on port 8080"));
//! ```

/// Log a formatted message at the given level.
///
/// ```
/// # use logtee::prelude::*;
/// # let logger = Config::default().build().unwrap();
/// use logtee::log;
/// log!(logger, LogLevel::Info, "plain message");
/// log!(logger, LogLevel::Error, "status {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log a formatted message at `error`.
///
/// ```
/// # use logtee::prelude::*;
/// # let logger = Config::default().build().unwrap();
/// use logtee::error;
/// error!(logger, "upstream {} unreachable", "billing-db");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! dpanic {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::DPanic, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{JsonEncoder, LevelController, LevelGate, LogLevel, Logger, Route, Tee};
    use crate::sinks::MemorySink;
    use std::sync::Arc;

    fn logger() -> (MemorySink, Logger) {
        let sink = MemorySink::new();
        let controller = LevelController::new(LogLevel::Debug);
        let tee = Tee::new(vec![Route::new(
            "primary",
            Arc::new(JsonEncoder::new()),
            Arc::new(sink.clone()),
            LevelGate::Dynamic(controller.clone()),
        )]);
        (sink, Logger::new(tee, controller))
    }

    #[test]
    fn test_level_macros() {
        let (sink, logger) = logger();
        debug!(logger, "d {}", 1);
        info!(logger, "i {}", 2);
        warn!(logger, "w {}", 3);
        error!(logger, "e {}", 4);
        dpanic!(logger, "p {}", 5);

        let levels: Vec<String> = sink
            .lines()
            .iter()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                format!("{} {}", v["level"].as_str().unwrap(), v["msg"].as_str().unwrap())
            })
            .collect();
        assert_eq!(
            levels,
            vec!["debug d 1", "info i 2", "warn w 3", "error e 4", "dpanic p 5"]
        );
    }

    #[test]
    fn test_macro_caller_is_invocation_site() {
        let (sink, logger) = logger();
        let line = line!() + 1;
        info!(logger, "here");
        let v: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
        assert!(v["caller"].as_str().unwrap().ends_with(&format!(":{}", line)));
    }
}
