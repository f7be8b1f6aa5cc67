use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Source '{path}' could not be imported: {message}")]
    SourceError { path: String, message: String },

    #[error("Row {row}: invalid {field} '{value}': {reason}")]
    RowError {
        row: u64,
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error for '{field}' ('{value}'): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Import pass exceeded the maximum run duration of {seconds}s")]
    RunTimeout { seconds: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Row,
    Lookup,
    Validation,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn validation(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        EtlError::ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn source(path: &str, message: impl Into<String>) -> Self {
        EtlError::SourceError {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::SourceError { .. } => ErrorCategory::Source,
            EtlError::RowError { .. } => ErrorCategory::Row,
            EtlError::NotFound { .. } => ErrorCategory::Lookup,
            EtlError::ValidationError { .. } => ErrorCategory::Validation,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) | EtlError::RunTimeout { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Row => ErrorSeverity::Low,
            ErrorCategory::Lookup | ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Source | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給操作人員的處理建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::SourceError { .. } => {
                "Check that the course CSV exists, is readable and has a CourseName header; the previous dataset is still being served"
            }
            EtlError::RowError { .. } => "Fix the offending row in the source file; the rest of the file was imported",
            EtlError::NotFound { .. } => "Verify the course id; it may have been replaced by a newer import pass",
            EtlError::ValidationError { .. } => "Correct the request parameters and try again",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => "Review the configuration file and command line flags",
            EtlError::RunTimeout { .. } => {
                "Increase schedule.max_run_seconds or investigate why the source is slow to read"
            }
            EtlError::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Source => format!("Course import failed: {}", self),
            ErrorCategory::Row => format!("A course row was skipped: {}", self),
            ErrorCategory::Lookup => format!("Not found: {}", self),
            ErrorCategory::Validation => format!("Invalid request: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// 依嚴重程度決定 CLI 的結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = EtlError::NotFound { entity: "Course", id: 7 };
        assert_eq!(err.category(), ErrorCategory::Lookup);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.to_string(), "Course 7 not found");

        let err = EtlError::source("data.csv", "missing CourseName column");
        assert_eq!(err.category(), ErrorCategory::Source);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_row_error_message_carries_context() {
        let err = EtlError::RowError {
            row: 4,
            field: "Price".to_string(),
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "Row 4: invalid Price 'abc': not a number");
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }
}
