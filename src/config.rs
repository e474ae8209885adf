//! Declarative logger configuration
//!
//! Keys are camelCase so existing TOML/JSON/YAML-converted config files can
//! be reused as they are:
//!
//! ```toml
//! name = "billing"
//! level = "info"
//! mode = "file"
//! filename = "logs/billing.log"
//! errorFileName = "logs/billing.err.log"
//! maxSize = 100
//! maxBackUp = 5
//! json = true
//! port = 9090
//!
//! isReport = true
//! [reportConfig]
//! type = "slack"
//! token = "https://hooks.slack.com/services/..."
//! level = "error"
//! ```

use crate::core::{LogLevel, LoggerError, Logger, LoggerBuilder, Result, TimestampFormat};
use crate::report::{DEFAULT_REPORT_COUNT, DEFAULT_REPORT_INTERVAL};
use crate::sinks::RotationPolicy;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Where the primary route writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Console,
    File,
}

impl FromStr for Mode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "console" => Ok(Mode::Console),
            "file" => Ok(Mode::File),
            _ => Err(LoggerError::config(
                "Config",
                format!("mode must be console or file, got '{}'", s),
            )),
        }
    }
}

/// Alert reporting settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportConfig {
    /// Integration name; only `slack` is supported
    #[serde(rename = "type")]
    pub kind: String,
    /// Integration credential; the webhook URL for Slack
    pub token: String,
    /// Seconds between periodic flushes, 0 disables them
    pub flush_sec: u64,
    /// Pending records that trigger an immediate flush, 0 or less disables it
    pub max_count: i64,
    /// Minimum severity that gets reported
    pub level: LogLevel,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            kind: "slack".to_string(),
            token: String::new(),
            flush_sec: DEFAULT_REPORT_INTERVAL.as_secs(),
            max_count: DEFAULT_REPORT_COUNT,
            level: LogLevel::Error,
        }
    }
}

impl ReportConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_sec)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Added to every record as the `project` field
    pub name: Option<String>,
    /// Initial threshold of the primary route
    pub level: LogLevel,
    pub stacktrace: bool,
    pub add_caller: bool,
    #[serde(alias = "callerShip")]
    pub caller_skip: usize,
    /// `console` or `file`
    pub mode: String,
    pub filename: Option<String>,
    /// Extra file receiving only `error` and above
    pub error_file_name: Option<String>,
    /// Rotation size in MiB, 0 for the default
    pub max_size: u64,
    /// Backup retention in days, 0 keeps them forever
    pub max_age: u64,
    #[serde(alias = "maxBackUp")]
    pub max_backup: usize,
    /// Buffer file and console routes in memory
    #[serde(rename = "async")]
    pub async_write: bool,
    pub json: bool,
    pub compress: bool,
    /// Echo `error` and above to stdout in file mode
    pub console: bool,
    pub color: bool,
    /// Control endpoint port, 0 disables it
    pub port: u16,
    pub time_format: TimestampFormat,
    pub is_report: bool,
    pub report_config: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            level: LogLevel::Info,
            stacktrace: true,
            add_caller: true,
            caller_skip: 0,
            mode: "console".to_string(),
            filename: None,
            error_file_name: None,
            max_size: 0,
            max_age: 0,
            max_backup: 0,
            async_write: false,
            json: false,
            compress: false,
            console: false,
            color: true,
            port: 0,
            time_format: TimestampFormat::default(),
            is_report: false,
            report_config: ReportConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.toml` or `.json` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LoggerError::io_operation("reading config", path.display().to_string(), e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            other => Err(LoggerError::config(
                "Config",
                format!("unsupported config extension: {:?}", other.unwrap_or("")),
            )),
        }
    }

    pub fn parsed_mode(&self) -> Result<Mode> {
        self.mode.parse()
    }

    /// Rotation limits shared by every file route
    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::from_limits(self.max_size, self.max_age, self.max_backup, self.compress)
    }

    /// Assemble the topology with stdout as the console sink
    pub fn build(&self) -> Result<Logger> {
        LoggerBuilder::new(self.clone()).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.stacktrace);
        assert!(config.add_caller);
        assert!(config.color);
        assert_eq!(config.parsed_mode().unwrap(), Mode::Console);
        assert_eq!(config.report_config.flush_sec, 3);
        assert_eq!(config.report_config.max_count, 20);
        assert_eq!(config.report_config.level, LogLevel::Error);
    }

    #[test]
    fn test_toml() {
        let config = Config::from_toml_str(
            r#"
            name = "billing"
            level = "WARN"
            mode = "file"
            filename = "/var/log/billing.log"
            maxBackUp = 4
            async = true
            callerShip = 2

            isReport = true
            [reportConfig]
            type = "slack"
            token = "https://hooks.example.com/x"
            maxCount = 5
            level = "dpanic"
            "#,
        )
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("billing"));
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.parsed_mode().unwrap(), Mode::File);
        assert_eq!(config.max_backup, 4);
        assert!(config.async_write);
        assert_eq!(config.caller_skip, 2);
        assert!(config.color);
        assert_eq!(config.report_config.max_count, 5);
        assert_eq!(config.report_config.flush_sec, 3);
        assert_eq!(config.report_config.level, LogLevel::DPanic);
    }

    #[test]
    fn test_json() {
        let config = Config::from_json_str(
            r#"{"level":"debug","json":true,"color":false,"port":9090,"timeFormat":"rfc3339"}"#,
        )
        .unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.json);
        assert!(!config.color);
        assert_eq!(config.port, 9090);
        assert_eq!(config.time_format, TimestampFormat::Rfc3339);
    }

    #[test]
    fn test_bad_level_rejected() {
        assert!(Config::from_json_str(r#"{"level":"loud"}"#).is_err());
        assert_eq!(
            Config::from_toml_str("level = \"\"").unwrap().level,
            LogLevel::Info
        );
    }

    #[test]
    fn test_bad_time_format_rejected() {
        assert!(Config::from_json_str(r#"{"timeFormat":"%Q"}"#).is_err());
        assert!(Config::from_toml_str("timeFormat = \"%H:%\"").is_err());
        let config = Config::from_toml_str("timeFormat = \"%H:%M\"").unwrap();
        assert_eq!(config.time_format, TimestampFormat::Custom("%H:%M".to_string()));
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("log.toml");
        std::fs::File::create(&toml_path)
            .unwrap()
            .write_all(b"level = \"error\"\n")
            .unwrap();
        assert_eq!(Config::load(&toml_path).unwrap().level, LogLevel::Error);

        let yaml_path = dir.path().join("log.yaml");
        std::fs::write(&yaml_path, "level: error\n").unwrap();
        assert!(matches!(
            Config::load(&yaml_path),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("file".parse::<Mode>().unwrap(), Mode::File);
        assert!("stdout".parse::<Mode>().is_err());
    }
}
