//! Logging hooks for third-party client libraries
//!
//! Client libraries (message-queue drivers and the like) often accept a
//! `print`/`printf`/`println` style logger. [`ClientLogAdapter`] exposes
//! exactly that shape and forwards everything at `debug` with a `module`
//! field naming the library.

use crate::core::{LogContext, LogLevel, Logger};
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

pub struct ClientLogAdapter {
    logger: ArcSwap<Logger>,
    module: String,
}

impl ClientLogAdapter {
    pub fn new(logger: Logger, module: impl Into<String>) -> Self {
        Self {
            logger: ArcSwap::from_pointee(logger),
            module: module.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Point the adapter at a different logger
    pub fn update(&self, logger: Logger) {
        self.logger.store(Arc::new(logger));
    }

    #[track_caller]
    fn emit(&self, message: &str) {
        let context = LogContext::new().with_field("module", self.module.as_str());
        self.logger
            .load()
            .log_with_context(LogLevel::Debug, message, context);
    }

    /// Values concatenated without separators
    #[track_caller]
    pub fn print(&self, values: &[&dyn fmt::Display]) {
        let message: String = values.iter().map(|v| v.to_string()).collect();
        self.emit(&message);
    }

    /// Values separated by single spaces
    #[track_caller]
    pub fn println(&self, values: &[&dyn fmt::Display]) {
        let message = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.emit(&message);
    }

    #[track_caller]
    pub fn print_fmt(&self, args: fmt::Arguments<'_>) {
        self.emit(&args.to_string());
    }
}

impl fmt::Debug for ClientLogAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientLogAdapter")
            .field("module", &self.module)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JsonEncoder, LevelController, LevelGate, Route, Tee};
    use crate::sinks::MemorySink;

    fn logger(level: LogLevel) -> (MemorySink, Logger) {
        let sink = MemorySink::new();
        let controller = LevelController::new(level);
        let tee = Tee::new(vec![Route::new(
            "primary",
            Arc::new(JsonEncoder::new()),
            Arc::new(sink.clone()),
            LevelGate::Dynamic(controller.clone()),
        )]);
        (sink, Logger::new(tee, controller))
    }

    fn record(sink: &MemorySink, index: usize) -> serde_json::Value {
        serde_json::from_str(&sink.lines()[index]).unwrap()
    }

    #[test]
    fn test_print_variants() {
        let (sink, logger) = logger(LogLevel::Debug);
        let adapter = ClientLogAdapter::new(logger, "kafka");

        adapter.print(&[&"broker", &3]);
        adapter.println(&[&"broker", &3, &"up"]);
        adapter.print_fmt(format_args!("partition {} lag {}", 7, 120));

        assert_eq!(record(&sink, 0)["msg"], "broker3");
        assert_eq!(record(&sink, 1)["msg"], "broker 3 up");
        assert_eq!(record(&sink, 2)["msg"], "partition 7 lag 120");
        assert_eq!(record(&sink, 2)["level"], "debug");
        assert_eq!(record(&sink, 2)["module"], "kafka");
    }

    #[test]
    fn test_respects_level_and_update() {
        let (quiet_sink, quiet) = logger(LogLevel::Info);
        let adapter = ClientLogAdapter::new(quiet, "kafka");
        adapter.print(&[&"ignored"]);
        assert!(quiet_sink.lines().is_empty());

        let (loud_sink, loud) = logger(LogLevel::Debug);
        adapter.update(loud);
        adapter.print(&[&"seen"]);
        assert_eq!(loud_sink.lines().len(), 1);
    }
}
