//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML configuration decode error
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Unknown severity name
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSinkError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Alert report failed
    #[error("Report failed ({kind}): {message}")]
    ReportError { kind: String, message: String },

    /// Alert endpoint answered with something other than 200
    #[error("Report endpoint returned non-200 status code: {status}")]
    ReportStatus { status: u16 },

    /// Control endpoint could not start
    #[error("Level server failed on '{addr}': {message}")]
    ServerError { addr: String, message: String },

    /// One or more routes failed while the others were still written
    #[error("{} route(s) failed: {}", .failures.len(), format_failures(.failures))]
    Fanout { failures: Vec<(String, LoggerError)> },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn format_failures(failures: &[(String, LoggerError)]) -> String {
    failures
        .iter()
        .map(|(route, err)| format!("{}: {}", route, err))
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a report error for the given integration
    pub fn report(kind: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ReportError {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a control endpoint error
    pub fn server(addr: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ServerError {
            addr: addr.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Collapse a list of per-route failures, `Ok` when empty
    pub fn from_failures(failures: Vec<(String, LoggerError)>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::Fanout { failures })
        }
    }
}
