//! Core logger types and traits

pub mod builder;
pub mod encoder;
pub mod error;
pub mod level_controller;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod route;
pub mod sink;
pub mod ticker;
pub mod timestamp;

pub use builder::LoggerBuilder;
pub use encoder::{Encoder, JsonEncoder, LevelEncoding, TextEncoder};
pub use error::{LoggerError, Result};
pub use level_controller::LevelController;
pub use log_context::{FieldValue, LogContext};
pub use log_entry::{Caller, LogEntry};
pub use log_level::{parse_level, LogLevel, STACKTRACE_LEVEL};
pub use logger::{Logger, LoggerOptions};
pub use metrics::LoggerMetrics;
pub use route::{LevelGate, Route, Tee};
pub use sink::Sink;
pub use timestamp::TimestampFormat;
