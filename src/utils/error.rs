use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Artifact not found: {path}")]
    ArtifactMissing { path: String },

    #[error("Artifact '{path}' is invalid: {reason}")]
    ArtifactCorrupt { path: String, reason: String },

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigError { field: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

/// Failures raised while transforming records or scoring features.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("columns are missing: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("column '{column}' row {row}: cannot parse '{value}' as a number")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column '{column}' row {row}: found unknown category '{value}'")]
    UnknownCategory {
        column: String,
        row: usize,
        value: String,
    },

    #[error("model expects {expected} features but the preprocessor produced {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("the batch contains no rows")]
    EmptyBatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Artifact,
    Inference,
    Input,
    Configuration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ChurnError {
    pub fn validation(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config(field: &str, message: impl Into<String>) -> Self {
        Self::ConfigError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn corrupt(path: &str, reason: impl Into<String>) -> Self {
        Self::ArtifactCorrupt {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ArtifactMissing { .. } | Self::ArtifactCorrupt { .. } => ErrorCategory::Artifact,
            Self::Inference(_) => ErrorCategory::Inference,
            Self::ValidationError { .. } => ErrorCategory::Input,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) | Self::ZipError(_) => {
                ErrorCategory::Io
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Artifact | ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Inference | ErrorCategory::Io => ErrorSeverity::High,
            ErrorCategory::Input => ErrorSeverity::Medium,
        }
    }

    /// Fatal errors stop the process before any request is served.
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// True when the preprocessor rejected the shape or typing of the input table.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Inference(InferenceError::SchemaMismatch { .. })
                | Self::Inference(InferenceError::InvalidValue { .. })
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ArtifactMissing { path } => format!(
                "Model or preprocessor files not found. Please ensure they exist in the artifact directory (missing: {}).",
                path
            ),
            Self::ArtifactCorrupt { path, reason } => {
                format!("Could not load artifact '{}': {}", path, reason)
            }
            Self::Inference(e) => format!("Error during prediction: {}", e),
            Self::ValidationError { field, value, reason } => {
                format!("Invalid input for {}: {} ({})", field, value, reason)
            }
            Self::ConfigError { field, message } => {
                format!("Configuration problem in {}: {}", field, message)
            }
            Self::CsvError(e) => format!("Error processing the CSV file: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ArtifactMissing { .. } => {
                "Place preprocessing.json and best_model_voting.json in the artifact directory or pass --artifact-dir"
            }
            Self::ArtifactCorrupt { .. } => {
                "Re-export the artifacts; the preprocessor output width must match the model's n_features"
            }
            Self::Inference(InferenceError::SchemaMismatch { .. }) => {
                "Make sure the CSV header contains every column listed by `churn-predict inspect`"
            }
            Self::Inference(InferenceError::EmptyBatch) => "Upload a file with at least one data row",
            Self::Inference(_) => "Check the offending cell; values must match the categories and types seen in training",
            Self::ValidationError { .. } => "Use a value inside the allowed range",
            Self::ConfigError { .. } => "Fix the configuration file or command line flag",
            Self::CsvError(_) => "Check that the file is a comma-separated file with a header row",
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Check that the input is valid JSON",
            Self::ZipError(_) => "Disable compression or check the output directory",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_message_lists_columns() {
        let err = ChurnError::from(InferenceError::SchemaMismatch {
            missing: vec!["Contract".to_string(), "tenure".to_string()],
        });
        assert!(err.is_schema_mismatch());
        assert_eq!(err.category(), ErrorCategory::Inference);
        assert!(err.to_string().contains("Contract, tenure"));
    }

    #[test]
    fn test_artifact_errors_are_fatal() {
        let err = ChurnError::ArtifactMissing {
            path: "./best_model_voting.json".to_string(),
        };
        assert!(err.is_fatal());
        assert!(err.user_friendly_message().contains("not found"));

        let err = ChurnError::validation("tenure", 73, "Value must be between 0 and 72");
        assert!(!err.is_fatal());
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_unknown_category_is_not_schema_mismatch() {
        let err = ChurnError::from(InferenceError::UnknownCategory {
            column: "Contract".to_string(),
            row: 3,
            value: "Weekly".to_string(),
        });
        assert!(!err.is_schema_mismatch());
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
