//! Log entry structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

/// Source location a record was emitted from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

impl Caller {
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
        }
    }

    /// Resolve the caller `skip` frames above `location`.
    ///
    /// `location` is the immediate call site (from `#[track_caller]`). With a
    /// non-zero skip the current backtrace is searched for that call site and
    /// the frame `skip` levels further out is reported instead. Falls back to
    /// `location` when the backtrace carries no usable symbols.
    pub fn resolve(location: &Location<'_>, skip: usize) -> Self {
        if skip == 0 {
            return Self::from_location(location);
        }
        let rendered = Backtrace::force_capture().to_string();
        Self::resolve_in(&rendered, location.file(), location.line(), location.column(), skip)
            .unwrap_or_else(|| Self::from_location(location))
    }

    fn resolve_in(backtrace: &str, file: &str, line: u32, column: u32, skip: usize) -> Option<Self> {
        let frames = frame_locations(backtrace);
        let needle = format!("{}:{}:{}", file, line, column);
        let start = frames
            .iter()
            .position(|loc| loc.as_deref().is_some_and(|l| l.ends_with(&needle)))?;

        frames
            .get(start + skip..)?
            .iter()
            .flatten()
            .next()
            .and_then(|loc| parse_location(loc))
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One entry per numbered frame: the first `at path:line:col` under it, if any
fn frame_locations(backtrace: &str) -> Vec<Option<String>> {
    let mut frames: Vec<Option<String>> = Vec::new();
    for raw in backtrace.lines() {
        let line = raw.trim_start();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(last) = frames.last_mut() {
                if last.is_none() {
                    *last = Some(location.trim().to_string());
                }
            }
        } else if line
            .split_once(": ")
            .is_some_and(|(idx, _)| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
        {
            frames.push(None);
        }
    }
    frames
}

fn parse_location(location: &str) -> Option<Caller> {
    let mut parts = location.rsplitn(3, ':');
    let _column = parts.next()?;
    let line = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    Some(Caller {
        file: file.to_string(),
        line,
    })
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub context: LogContext,
    pub caller: Option<Caller>,
    pub stacktrace: Option<String>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            timestamp: Local::now(),
            context: LogContext::new(),
            caller: None,
            stacktrace: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }
}
