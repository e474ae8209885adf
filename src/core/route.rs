//! Routes and the tee that fans records out to them

use super::encoder::Encoder;
use super::error::{LoggerError, Result};
use super::level_controller::LevelController;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::sink::Sink;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Minimum severity a route accepts
#[derive(Debug, Clone)]
pub enum LevelGate {
    Fixed(LogLevel),
    /// Follows a shared controller that can change at runtime
    Dynamic(LevelController),
}

impl LevelGate {
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.threshold()
    }

    #[inline]
    pub fn threshold(&self) -> LogLevel {
        match self {
            LevelGate::Fixed(level) => *level,
            LevelGate::Dynamic(controller) => controller.level(),
        }
    }
}

/// One destination: an encoder, a sink and a gate
pub struct Route {
    name: String,
    encoder: Arc<dyn Encoder>,
    sink: Arc<dyn Sink>,
    gate: LevelGate,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        encoder: Arc<dyn Encoder>,
        sink: Arc<dyn Sink>,
        gate: LevelGate,
    ) -> Self {
        Self {
            name: name.into(),
            encoder,
            sink,
            gate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gate(&self) -> &LevelGate {
        &self.gate
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.gate.enabled(level)
    }

    /// Encode and write one record. Records above `Error` are flushed
    /// immediately since the process may be about to go down.
    pub fn write(&self, entry: &LogEntry) -> Result<()> {
        let bytes = self.encoder.encode(entry)?;
        self.sink.write(&bytes)?;
        if entry.level > LogLevel::Error {
            self.sink.flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("sink", &self.sink.name())
            .field("gate", &self.gate)
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `op` with panic isolation, turning a panic into an error
fn isolated<T>(op: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(result) => result,
        Err(payload) => Err(LoggerError::writer(format!(
            "panicked: {}",
            panic_message(payload)
        ))),
    }
}

/// Fan-out over a fixed list of routes
///
/// Every enabled route is attempted even when earlier ones fail or panic;
/// failures come back together as [`LoggerError::Fanout`].
#[derive(Debug, Default)]
pub struct Tee {
    routes: Vec<Route>,
}

impl Tee {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// True if any route accepts `level`
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.routes.iter().any(|route| route.enabled(level))
    }

    pub fn write(&self, entry: &LogEntry) -> Result<()> {
        let mut failures = Vec::new();
        for route in self.routes.iter().filter(|r| r.enabled(entry.level)) {
            if let Err(e) = isolated(|| route.write(entry)) {
                failures.push((route.name.clone(), e));
            }
        }
        LoggerError::from_failures(failures)
    }

    pub fn sync(&self) -> Result<()> {
        self.for_each_sink(|sink| sink.flush())
    }

    pub fn close(&self) -> Result<()> {
        self.for_each_sink(|sink| sink.close())
    }

    // Routes may share a sink; each sink is visited once.
    fn for_each_sink(&self, op: impl Fn(&dyn Sink) -> Result<()>) -> Result<()> {
        let mut seen: Vec<*const ()> = Vec::with_capacity(self.routes.len());
        let mut failures = Vec::new();
        for route in &self.routes {
            let ptr = Arc::as_ptr(&route.sink) as *const ();
            if seen.contains(&ptr) {
                continue;
            }
            seen.push(ptr);
            if let Err(e) = isolated(|| op(route.sink.as_ref())) {
                failures.push((route.name.clone(), e));
            }
        }
        LoggerError::from_failures(failures)
    }
}
