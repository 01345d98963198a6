//! Error types for the logging pipeline

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
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A programming error in the logger configuration
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Strict level lookup found no level with this name
    #[error("Unknown level name '{name}'")]
    UnknownLevel { name: String },

    /// The sink rejected or failed a write
    #[error("Write failed in {writer}: {message}")]
    WriteFailure { writer: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// Malformed size string such as "12Q"
    #[error("Invalid size '{input}'")]
    InvalidSize { input: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
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

    pub fn unknown_level(name: impl Into<String>) -> Self {
        LoggerError::UnknownLevel { name: name.into() }
    }

    /// Create a write failure attributed to the named writer
    pub fn writer(writer: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::WriteFailure {
            writer: writer.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_size(input: impl Into<String>) -> Self {
        LoggerError::InvalidSize {
            input: input.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

impl From<LoggerError> for std::io::Error {
    fn from(err: LoggerError) -> Self {
        match err {
            LoggerError::Io(e) => e,
            LoggerError::IoOperation { source, .. } => source,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("Logger", "negative level");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::unknown_level("verbose");
        assert!(matches!(err, LoggerError::UnknownLevel { .. }));

        let err = LoggerError::writer("SizedRotatingFile", "file closed");
        assert!(matches!(err, LoggerError::WriteFailure { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::unknown_level("verbose");
        assert_eq!(err.to_string(), "Unknown level name 'verbose'");

        let err = LoggerError::file_rotation("/var/log/app.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': Disk full"
        );

        let err = LoggerError::config("Logger", "the log writer must be set");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for Logger: the log writer must be set"
        );

        assert_eq!(LoggerError::invalid_size("12Q").to_string(), "Invalid size '12Q'");
    }

    #[test]
    fn test_into_io_error() {
        let io_err: std::io::Error = LoggerError::writer("FileWriter", "closed").into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::Other);
        assert!(io_err.to_string().contains("closed"));

        let original = std::io::Error::new(std::io::ErrorKind::WriteZero, "zero");
        let io_err: std::io::Error = LoggerError::Io(original).into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("opening log file", "cannot open app.log", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("opening log file"));
        assert!(err.to_string().contains("cannot open app.log"));
    }
}
