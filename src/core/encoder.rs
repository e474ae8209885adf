//! Record encoders
//!
//! An encoder turns one [`LogEntry`] into the exact bytes handed to a sink,
//! including the trailing line ending:
//! - [`TextEncoder`]: tab-separated, human-readable, optionally colored level
//! - [`JsonEncoder`]: one JSON object per line

use super::error::Result;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use colored::Colorize;

/// Serializes records into bytes
pub trait Encoder: Send + Sync {
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>>;

    /// Rendering of a severity label on its own
    fn encode_level(&self, level: LogLevel) -> String;
}

/// How severity labels are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelEncoding {
    /// `error`
    #[default]
    Lowercase,
    /// `ERROR`
    Capital,
    /// `ERROR` wrapped in ANSI color codes
    CapitalColor,
}

impl LevelEncoding {
    pub fn render(&self, level: LogLevel) -> String {
        match self {
            LevelEncoding::Lowercase => level.as_str().to_string(),
            LevelEncoding::Capital => level.to_capital_str().to_string(),
            LevelEncoding::CapitalColor => level
                .to_capital_str()
                .color(level.color_code())
                .to_string(),
        }
    }
}

/// Human-readable encoder
///
/// Example: `2025-01-08-10:30:45	INFO	src/main.rs:12	Request processed	{"user_id":7}`
#[derive(Debug, Clone, Default)]
pub struct TextEncoder {
    timestamp_format: TimestampFormat,
    level_encoding: LevelEncoding,
}

impl TextEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_level_encoding(mut self, encoding: LevelEncoding) -> Self {
        self.level_encoding = encoding;
        self
    }
}

impl Encoder for TextEncoder {
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>> {
        let mut line = String::with_capacity(64 + entry.message.len());
        line.push_str(&self.timestamp_format.format(&entry.timestamp));
        line.push('\t');
        line.push_str(&self.encode_level(entry.level));
        if let Some(ref caller) = entry.caller {
            line.push('\t');
            line.push_str(&caller.to_string());
        }
        line.push('\t');
        line.push_str(&entry.message);

        if !entry.context.is_empty() {
            line.push('\t');
            line.push_str(&serde_json::to_string(&entry.context.to_json_object())?);
        }
        line.push('\n');

        if let Some(ref stack) = entry.stacktrace {
            line.push_str(stack.trim_end());
            line.push('\n');
        }

        Ok(line.into_bytes())
    }

    fn encode_level(&self, level: LogLevel) -> String {
        self.level_encoding.render(level)
    }
}

/// Structured encoder
///
/// Example: `{"level":"info","time":"2025-01-08-10:30:45","msg":"Request processed","user_id":7}`
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    timestamp_format: TimestampFormat,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn timestamp_value(&self, entry: &LogEntry) -> serde_json::Value {
        if self.timestamp_format.is_numeric() {
            serde_json::Value::Number(entry.timestamp.timestamp_millis().into())
        } else {
            serde_json::Value::String(self.timestamp_format.format(&entry.timestamp))
        }
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>> {
        let mut obj = serde_json::Map::new();
        obj.insert(
            "level".to_string(),
            serde_json::Value::String(self.encode_level(entry.level)),
        );
        obj.insert("time".to_string(), self.timestamp_value(entry));
        if let Some(ref caller) = entry.caller {
            obj.insert(
                "caller".to_string(),
                serde_json::Value::String(caller.to_string()),
            );
        }
        obj.insert(
            "msg".to_string(),
            serde_json::Value::String(entry.message.clone()),
        );
        for (key, value) in entry.context.fields() {
            obj.insert(key.to_string(), value.to_json_value());
        }
        if let Some(ref stack) = entry.stacktrace {
            obj.insert(
                "stacktrace".to_string(),
                serde_json::Value::String(stack.clone()),
            );
        }

        let mut bytes = serde_json::to_vec(&serde_json::Value::Object(obj))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn encode_level(&self, level: LogLevel) -> String {
        LevelEncoding::Lowercase.render(level)
    }
}
