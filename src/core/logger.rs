//! Logger handle

use super::error::{LoggerError, Result};
use super::level_controller::LevelController;
use super::log_context::{FieldValue, LogContext};
use super::log_entry::{Caller, LogEntry};
use super::log_level::{LogLevel, STACKTRACE_LEVEL};
use super::metrics::LoggerMetrics;
use super::route::Tee;
use crate::server::LevelServer;
use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-record decorations applied by the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Attach `file:line` of the call site
    pub add_caller: bool,
    /// Frames to skip above the call site when reporting the caller
    pub caller_skip: usize,
    /// Attach a stack trace to records at `STACKTRACE_LEVEL` and above
    pub stacktrace: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            add_caller: true,
            caller_skip: 0,
            stacktrace: true,
        }
    }
}

struct LoggerCore {
    tee: Tee,
    controller: LevelController,
    options: LoggerOptions,
    metrics: LoggerMetrics,
    server: Mutex<Option<LevelServer>>,
    closed: AtomicBool,
}

impl LoggerCore {
    fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(mut server) = self.server.lock().take() {
            server.shutdown();
        }
        self.tee.close()
    }
}

impl Drop for LoggerCore {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(error = %e, "logger shutdown failed");
        }
    }
}

/// Handle to a built topology.
///
/// Clones are cheap and share the routes, level and background tasks.
/// Derived loggers from [`Logger::with_field`] carry extra static fields
/// but otherwise share the same core. Background tasks stop and buffers are
/// flushed when [`Logger::shutdown`] is called or the last handle is dropped.
///
/// # Example
///
/// ```
/// use logtee::core::{LevelGate, Route, Tee};
/// use logtee::sinks::MemorySink;
/// use logtee::{LevelController, LogLevel, Logger, TextEncoder};
/// use std::sync::Arc;
///
/// let sink = MemorySink::new();
/// let controller = LevelController::new(LogLevel::Info);
/// let tee = Tee::new(vec![Route::new(
///     "primary",
///     Arc::new(TextEncoder::new()),
///     Arc::new(sink.clone()),
///     LevelGate::Dynamic(controller.clone()),
/// )]);
///
/// let logger = Logger::new(tee, controller).with_field("project", "demo");
/// logger.debug("hidden");
/// logger.info("shown");
///
/// assert_eq!(sink.lines().len(), 1);
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    fields: LogContext,
}

impl Logger {
    pub fn new(tee: Tee, controller: LevelController) -> Self {
        Self::with_options(tee, controller, LoggerOptions::default())
    }

    pub fn with_options(tee: Tee, controller: LevelController, options: LoggerOptions) -> Self {
        Self::from_parts(tee, controller, options, None)
    }

    pub(crate) fn from_parts(
        tee: Tee,
        controller: LevelController,
        options: LoggerOptions,
        server: Option<LevelServer>,
    ) -> Self {
        Self {
            core: Arc::new(LoggerCore {
                tee,
                controller,
                options,
                metrics: LoggerMetrics::new(),
                server: Mutex::new(server),
                closed: AtomicBool::new(false),
            }),
            fields: LogContext::new(),
        }
    }

    /// Derived logger with one more static field
    #[must_use]
    pub fn with_field<K, V>(&self, key: K, value: V) -> Logger
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut derived = self.clone();
        derived.fields.add_field(key, value);
        derived
    }

    /// Derived logger with all fields of `context` added
    #[must_use]
    pub fn with_context(&self, context: &LogContext) -> Logger {
        let mut derived = self.clone();
        derived.fields.extend(context);
        derived
    }

    pub fn fields(&self) -> &LogContext {
        &self.fields
    }

    /// Emit a record; route failures are reported through `tracing`
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.log_with_context(level, message, LogContext::new());
    }

    #[track_caller]
    pub fn log_with_context(&self, level: LogLevel, message: impl AsRef<str>, context: LogContext) {
        if let Err(e) = self.try_log_with_context(level, message, context) {
            tracing::error!(level = %level, error = %e, "log write failed");
        }
    }

    /// Emit a record and return the aggregated route failures, if any
    #[track_caller]
    pub fn try_log(&self, level: LogLevel, message: impl AsRef<str>) -> Result<()> {
        self.try_log_with_context(level, message, LogContext::new())
    }

    #[track_caller]
    pub fn try_log_with_context(
        &self,
        level: LogLevel,
        message: impl AsRef<str>,
        context: LogContext,
    ) -> Result<()> {
        if !self.core.tee.enabled(level) {
            self.core.metrics.record_filtered();
            return Ok(());
        }

        let entry = self.build_entry(level, message.as_ref(), context, Location::caller());
        let result = self.core.tee.write(&entry);
        self.core.metrics.record_written();
        if let Err(LoggerError::Fanout { ref failures }) = result {
            self.core.metrics.record_route_failures(failures.len() as u64);
        }
        result
    }

    fn build_entry(
        &self,
        level: LogLevel,
        message: &str,
        context: LogContext,
        location: &Location<'_>,
    ) -> LogEntry {
        let mut fields = self.fields.clone();
        fields.extend(&context);

        let mut entry = LogEntry::new(level, message).with_context(fields);
        let options = &self.core.options;
        if options.add_caller {
            entry = entry.with_caller(Caller::resolve(location, options.caller_skip));
        }
        if options.stacktrace && level >= STACKTRACE_LEVEL {
            entry = entry.with_stacktrace(Backtrace::force_capture().to_string());
        }
        entry
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    /// Log at `DPanic`. There is no development mode, so this never panics.
    #[track_caller]
    pub fn dpanic(&self, message: impl AsRef<str>) {
        self.log(LogLevel::DPanic, message);
    }

    /// Log at `Panic`, then panic with the same message
    #[track_caller]
    pub fn panic(&self, message: impl AsRef<str>) -> ! {
        let message = message.as_ref();
        self.log(LogLevel::Panic, message);
        panic!("{}", message);
    }

    /// Log at `Fatal`, flush every route, then exit with status 1
    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) -> ! {
        self.log(LogLevel::Fatal, message);
        if let Err(e) = self.core.shutdown() {
            tracing::error!(error = %e, "flush before exit failed");
        }
        std::process::exit(1);
    }

    /// Current threshold of the primary route
    pub fn level(&self) -> LogLevel {
        self.core.controller.level()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.core.controller.set_level(level);
    }

    pub fn level_controller(&self) -> &LevelController {
        &self.core.controller
    }

    /// True if at least one route would accept `level`
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.core.tee.enabled(level)
    }

    pub fn tee(&self) -> &Tee {
        &self.core.tee
    }

    /// Flush every sink
    pub fn sync(&self) -> Result<()> {
        self.core.tee.sync()
    }

    /// Stop the control endpoint and background flushers, then close every
    /// sink. Later calls are no-ops.
    pub fn shutdown(&self) -> Result<()> {
        self.core.shutdown()
    }

    pub fn is_shutdown(&self) -> bool {
        self.core.closed.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.core.metrics
    }

    /// Address of the control endpoint, when one is running
    pub fn control_addr(&self) -> Option<SocketAddr> {
        self.core.server.lock().as_ref().map(|s| s.local_addr())
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("routes", &self.core.tee.routes().len())
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder::JsonEncoder;
    use crate::core::route::{LevelGate, Route};
    use crate::core::Sink;
    use crate::sinks::MemorySink;

    struct Failing;

    impl Sink for Failing {
        fn write(&self, _buf: &[u8]) -> Result<usize> {
            Err(LoggerError::writer("rejected"))
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    fn json_logger(options: LoggerOptions) -> (MemorySink, Logger) {
        let sink = MemorySink::new();
        let controller = LevelController::new(LogLevel::Info);
        let tee = Tee::new(vec![Route::new(
            "primary",
            Arc::new(JsonEncoder::new()),
            Arc::new(sink.clone()),
            LevelGate::Dynamic(controller.clone()),
        )]);
        (sink, Logger::with_options(tee, controller, options))
    }

    fn records(sink: &MemorySink) -> Vec<serde_json::Value> {
        sink.lines()
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_level_filtering_and_metrics() {
        let (sink, logger) = json_logger(LoggerOptions::default());
        logger.debug("dropped");
        logger.info("kept");

        assert_eq!(sink.lines().len(), 1);
        assert_eq!(logger.metrics().records_filtered(), 1);
        assert_eq!(logger.metrics().records_written(), 1);

        logger.set_level(LogLevel::Debug);
        logger.debug("now kept");
        assert_eq!(sink.lines().len(), 2);
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let (sink, logger) = json_logger(LoggerOptions::default());
        let line = line!() + 1;
        logger.info("where");

        let record = &records(&sink)[0];
        let caller = record["caller"].as_str().unwrap();
        assert!(caller.ends_with(&format!("logger.rs:{}", line)), "{}", caller);
    }

    #[test]
    fn test_caller_disabled() {
        let options = LoggerOptions {
            add_caller: false,
            ..LoggerOptions::default()
        };
        let (sink, logger) = json_logger(options);
        logger.info("nowhere");
        assert!(records(&sink)[0].get("caller").is_none());
    }

    #[test]
    fn test_static_fields_precede_call_fields() {
        let (sink, logger) = json_logger(LoggerOptions::default());
        let scoped = logger.with_field("project", "billing");
        scoped.log_with_context(
            LogLevel::Warn,
            "slow",
            LogContext::new().with_field("ms", 950),
        );

        let line = sink.lines().remove(0);
        let project = line.find("\"project\"").unwrap();
        let ms = line.find("\"ms\"").unwrap();
        assert!(project < ms);
        assert!(logger.fields().is_empty());
    }

    #[test]
    fn test_stacktrace_only_at_panic_level() {
        let (sink, logger) = json_logger(LoggerOptions::default());
        logger.error("no trace");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panic("with trace");
        }));
        assert!(result.is_err());

        let records = records(&sink);
        assert!(records[0].get("stacktrace").is_none());
        assert!(records[1]["stacktrace"].is_string());
        assert_eq!(records[1]["level"], "panic");
    }

    #[test]
    fn test_stacktrace_disabled_at_panic_level() {
        let options = LoggerOptions {
            stacktrace: false,
            ..LoggerOptions::default()
        };
        let (sink, logger) = json_logger(options);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panic("no trace either");
        }));
        assert!(result.is_err());

        let records = records(&sink);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "panic");
        assert!(records[0].get("stacktrace").is_none());
    }

    #[test]
    fn test_try_log_reports_failures() {
        let controller = LevelController::new(LogLevel::Debug);
        let healthy = MemorySink::new();
        let tee = Tee::new(vec![
            Route::new(
                "bad",
                Arc::new(JsonEncoder::new()),
                Arc::new(Failing),
                LevelGate::Fixed(LogLevel::Debug),
            ),
            Route::new(
                "good",
                Arc::new(JsonEncoder::new()),
                Arc::new(healthy.clone()),
                LevelGate::Dynamic(controller.clone()),
            ),
        ]);
        let logger = Logger::new(tee, controller);

        assert!(matches!(
            logger.try_log(LogLevel::Info, "partial"),
            Err(LoggerError::Fanout { .. })
        ));
        assert_eq!(healthy.lines().len(), 1);
        assert_eq!(logger.metrics().route_failures(), 1);

        // The non-try path swallows the error
        logger.info("again");
        assert_eq!(healthy.lines().len(), 2);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (sink, logger) = json_logger(LoggerOptions::default());
        let clone = logger.clone();
        logger.info("before");
        logger.shutdown().unwrap();
        assert!(clone.is_shutdown());
        clone.shutdown().unwrap();
        assert!(sink.flush_count() >= 1);
    }
}
