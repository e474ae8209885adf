//! Timestamp formatting for encoded records

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, SecondsFormat};
use serde::{de, Deserialize, Deserializer};

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use logtee::TimestampFormat;
///
/// assert_eq!(TimestampFormat::from_name("rfc3339").unwrap(), TimestampFormat::Rfc3339);
/// assert_eq!(
///     TimestampFormat::from_name("%d/%b/%Y").unwrap(),
///     TimestampFormat::Custom("%d/%b/%Y".to_string())
/// );
/// assert!(TimestampFormat::from_name("%Q").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Local time without zone: `2025-01-08-10:30:45`
    #[default]
    Compact,

    /// ISO 8601 with milliseconds and offset: `2025-01-08T10:30:45.123+01:00`
    Iso8601,

    /// RFC 3339 with seconds precision: `2025-01-08T10:30:45+01:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Any strftime-compatible format string
    Custom(String),
}

impl TimestampFormat {
    const COMPACT: &'static str = "%Y-%m-%d-%H:%M:%S";

    /// Map a configuration name to a format; unknown names are taken as strftime patterns
    ///
    /// Fails when the pattern contains a specifier chrono cannot render.
    pub fn from_name(name: &str) -> Result<Self> {
        let format = match name.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => TimestampFormat::Compact,
            "iso8601" => TimestampFormat::Iso8601,
            "rfc3339" => TimestampFormat::Rfc3339,
            "unix_millis" | "unixmillis" => TimestampFormat::UnixMillis,
            _ => TimestampFormat::Custom(name.to_string()),
        };
        format.validate()?;
        Ok(format)
    }

    /// Reject custom patterns that would fail at format time
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(pattern) = self {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "timeFormat",
                    format!("invalid strftime pattern '{}'", pattern),
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Compact => datetime.format(Self::COMPACT).to_string(),
            TimestampFormat::Iso8601 => datetime.to_rfc3339_opts(SecondsFormat::Millis, false),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339_opts(SecondsFormat::Secs, false),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis)
    }
}

impl<'de> Deserialize<'de> for TimestampFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name).map_err(de::Error::custom)
    }
}
