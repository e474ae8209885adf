//! Topology assembly from a [`Config`]

use super::encoder::{Encoder, JsonEncoder, LevelEncoding, TextEncoder};
use super::error::{LoggerError, Result};
use super::level_controller::LevelController;
use super::log_level::LogLevel;
use super::logger::{Logger, LoggerOptions};
use super::route::{LevelGate, Route, Tee};
use super::sink::Sink;
use crate::config::{Config, Mode};
use crate::report::{new_notifier, BufferedReporter, Notifier, NotifierKind};
use crate::server::LevelServer;
use crate::sinks::{BufferedSink, ConsoleSink, RotatingFileSink};
use std::sync::Arc;

/// Builds a [`Logger`] from a [`Config`].
///
/// Routes are assembled in a fixed order:
///
/// 1. `primary`: stdout or the rotating `filename`, gated by the runtime level
/// 2. `error-file`: the rotating `errorFileName` at `error` and above
/// 3. `console`: stdout echo at `error` and above, file mode only
/// 4. with `async`, routes 1 to 3 are wrapped in a [`BufferedSink`]
/// 5. `report`: JSON records at `reportConfig.level` into a [`BufferedReporter`]
///
/// The console sink and the notifier can be injected, which is how tests
/// observe the topology without touching stdout or the network.
///
/// # Example
///
/// ```
/// use logtee::sinks::MemorySink;
/// use logtee::{Config, LoggerBuilder};
/// use std::sync::Arc;
///
/// let out = MemorySink::new();
/// let config = Config {
///     name: Some("billing".to_string()),
///     json: true,
///     ..Config::default()
/// };
/// let logger = LoggerBuilder::new(config)
///     .console_sink(Arc::new(out.clone()))
///     .build()
///     .unwrap();
///
/// logger.info("ready");
/// assert!(out.contents_string().contains("\"project\":\"billing\""));
/// ```
pub struct LoggerBuilder {
    config: Config,
    console: Option<Arc<dyn Sink>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl LoggerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            console: None,
            notifier: None,
        }
    }

    /// Use `sink` wherever stdout would be written
    #[must_use]
    pub fn console_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.console = Some(sink);
        self
    }

    /// Use `notifier` for the report route instead of the configured integration
    #[must_use]
    pub fn notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn encoder(&self) -> Arc<dyn Encoder> {
        let format = self.config.time_format.clone();
        if self.config.json {
            Arc::new(JsonEncoder::new().with_timestamp_format(format))
        } else {
            let levels = if self.config.color {
                LevelEncoding::CapitalColor
            } else {
                LevelEncoding::Lowercase
            };
            Arc::new(
                TextEncoder::new()
                    .with_timestamp_format(format)
                    .with_level_encoding(levels),
            )
        }
    }

    fn file_sink(&self, path: &str) -> Result<Arc<dyn Sink>> {
        Ok(Arc::new(RotatingFileSink::with_policy(
            path,
            self.config.rotation_policy(),
        )?))
    }

    fn report_notifier(&mut self) -> Result<Box<dyn Notifier>> {
        match self.notifier.take() {
            Some(notifier) => Ok(notifier),
            None => {
                let report = &self.config.report_config;
                let kind: NotifierKind = report.kind.parse()?;
                new_notifier(kind, &report.token)
            }
        }
    }

    pub fn build(mut self) -> Result<Logger> {
        let mode = self.config.parsed_mode()?;
        self.config.time_format.validate()?;
        let filename = match mode {
            Mode::File => match self.config.filename.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => Some(name.to_string()),
                _ => {
                    return Err(LoggerError::config(
                        "Config",
                        "file mode, but file name is empty",
                    ))
                }
            },
            Mode::Console => None,
        };
        let notifier = if self.config.is_report {
            Some(self.report_notifier()?)
        } else {
            None
        };

        let controller = LevelController::new(self.config.level);
        let encoder = self.encoder();
        let console: Arc<dyn Sink> = match self.console.take() {
            Some(sink) => sink,
            None => Arc::new(ConsoleSink::stdout()),
        };

        let mut local: Vec<(&'static str, Arc<dyn Sink>, LevelGate)> = Vec::with_capacity(3);
        let primary = match filename {
            Some(ref path) => self.file_sink(path)?,
            None => Arc::clone(&console),
        };
        local.push(("primary", primary, LevelGate::Dynamic(controller.clone())));

        if let Some(path) = self
            .config
            .error_file_name
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            local.push((
                "error-file",
                self.file_sink(path)?,
                LevelGate::Fixed(LogLevel::Error),
            ));
        }

        if mode == Mode::File && self.config.console {
            local.push(("console", Arc::clone(&console), LevelGate::Fixed(LogLevel::Error)));
        }

        let mut routes = Vec::with_capacity(local.len() + 1);
        for (name, sink, gate) in local {
            let sink: Arc<dyn Sink> = if self.config.async_write {
                Arc::new(BufferedSink::with_defaults(sink)?)
            } else {
                sink
            };
            routes.push(Route::new(name, Arc::clone(&encoder), sink, gate));
        }

        if let Some(notifier) = notifier {
            let report = &self.config.report_config;
            let reporter =
                BufferedReporter::new(notifier, report.max_count, report.flush_interval())?;
            routes.push(Route::new(
                "report",
                Arc::new(JsonEncoder::new().with_timestamp_format(self.config.time_format.clone())),
                Arc::new(reporter),
                LevelGate::Fixed(report.level),
            ));
        }

        let options = LoggerOptions {
            add_caller: self.config.add_caller,
            caller_skip: self.config.caller_skip,
            stacktrace: self.config.stacktrace,
        };

        let server = if self.config.port > 0 {
            let addr = format!("0.0.0.0:{}", self.config.port);
            match LevelServer::bind(&addr, controller.clone()) {
                Ok(server) => Some(server),
                Err(e) => {
                    tracing::error!(addr = %addr, error = %e, "init log server start failed");
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(routes = routes.len(), mode = ?mode, "logger topology built");
        let logger = Logger::from_parts(Tee::new(routes), controller, options, server);
        Ok(match self.config.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => logger.with_field("project", name),
            None => logger,
        })
    }
}
