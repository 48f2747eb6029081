//! Error types for the logging system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Group name not present in the registry
    #[error("Unknown group '{name}'")]
    UnknownGroup { name: String },

    /// Sink name not present in the registry
    #[error("Unknown sink '{name}'")]
    UnknownSink { name: String },

    /// No live logger registered under this name
    #[error("Unknown logger '{name}'")]
    UnknownLogger { name: String },

    /// Re-parenting would make a group its own ancestor
    #[error("Setting parent '{parent}' for group '{group}' would create a cycle")]
    CycleDetected { group: String, parent: String },

    /// A group or sink with this name already exists
    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

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

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn unknown_group(name: impl Into<String>) -> Self {
        LoggerError::UnknownGroup { name: name.into() }
    }

    pub fn unknown_sink(name: impl Into<String>) -> Self {
        LoggerError::UnknownSink { name: name.into() }
    }

    pub fn unknown_logger(name: impl Into<String>) -> Self {
        LoggerError::UnknownLogger { name: name.into() }
    }

    pub fn cycle(group: impl Into<String>, parent: impl Into<String>) -> Self {
        LoggerError::CycleDetected {
            group: group.into(),
            parent: parent.into(),
        }
    }

    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        LoggerError::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

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

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::unknown_group("net");
        assert!(matches!(err, LoggerError::UnknownGroup { .. }));

        let err = LoggerError::cycle("a", "b");
        assert!(matches!(err, LoggerError::CycleDetected { .. }));

        let err = LoggerError::duplicate("sink", "console");
        assert!(matches!(err, LoggerError::DuplicateName { kind: "sink", .. }));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            LoggerError::unknown_sink("file").to_string(),
            "Unknown sink 'file'"
        );
        assert_eq!(
            LoggerError::cycle("a", "b").to_string(),
            "Setting parent 'b' for group 'a' would create a cycle"
        );
        assert_eq!(
            LoggerError::duplicate("group", "*").to_string(),
            "Duplicate group name '*'"
        );
        assert_eq!(
            LoggerError::config("SinkBuilder", "capacity must be positive").to_string(),
            "Invalid configuration for SinkBuilder: capacity must be positive"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
