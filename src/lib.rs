//! # logtee
//!
//! Configuration-driven fan-out logging.
//!
//! A [`Config`] describes a small topology of routes. Each record is
//! encoded once per route and written to every route whose threshold it
//! meets:
//!
//! - **primary**: stdout or a size-rotated file, gated by a runtime
//!   adjustable level
//! - **error-file** and **console** echo routes for `error` and above
//! - **report**: high-severity records batched into alert messages for an
//!   incoming webhook
//!
//! With `port` set, `GET /updateLevel?level=debug` on the control endpoint
//! changes the primary threshold without a restart.
//!
//! ```no_run
//! use logtee::Config;
//!
//! let config = Config::from_toml_str(r#"
//!     name = "billing"
//!     mode = "file"
//!     filename = "logs/billing.log"
//!     json = true
//!     port = 9090
//! "#)?;
//!
//! let logger = config.build()?;
//! logger.info("service started");
//! logger.sync()?;
//! # Ok::<(), logtee::LoggerError>(())
//! ```

pub mod adapter;
pub mod config;
pub mod core;
pub mod global;
pub mod macros;
pub mod report;
pub mod server;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{Config, ReportConfig};
    pub use crate::core::{
        FieldValue, LevelController, LogContext, LogLevel, Logger, LoggerBuilder, LoggerError,
        Result, Sink,
    };
}

pub use adapter::ClientLogAdapter;
pub use config::{Config, Mode, ReportConfig};
pub use core::{
    parse_level, Encoder, FieldValue, JsonEncoder, LevelController, LevelEncoding, LogContext,
    LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggerOptions, Result,
    Sink, TextEncoder, TimestampFormat, STACKTRACE_LEVEL,
};
pub use server::LevelServer;
