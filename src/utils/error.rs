use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Download failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Sources file not readable: {path}")]
    MissingSourcesError { path: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MergeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MergeError::FetchError(_) => ErrorCategory::Network,
            MergeError::IoError(_) | MergeError::MissingSourcesError { .. } => ErrorCategory::Io,
            MergeError::ConfigValidationError { .. }
            | MergeError::InvalidConfigValueError { .. }
            | MergeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MergeError::SerializationError(_) | MergeError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Fetch failures are handled per source and normally never
            // reach the top level.
            MergeError::FetchError(_) => ErrorSeverity::Medium,
            MergeError::IoError(_)
            | MergeError::MissingSourcesError { .. }
            | MergeError::SerializationError(_)
            | MergeError::ProcessingError { .. } => ErrorSeverity::High,
            MergeError::ConfigValidationError { .. }
            | MergeError::InvalidConfigValueError { .. }
            | MergeError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MergeError::FetchError(_) => {
                "Check the source URL and your network connection, then rerun".to_string()
            }
            MergeError::IoError(_) => {
                "Check filesystem permissions and free space for the output directory".to_string()
            }
            MergeError::SerializationError(_) => {
                "Rerun with --verbose and report the run summary that failed to serialize"
                    .to_string()
            }
            MergeError::MissingSourcesError { path } => {
                format!("Create '{}' with one source URL per line ('!' starts a comment)", path)
            }
            MergeError::ConfigValidationError { field, .. }
            | MergeError::InvalidConfigValueError { field, .. }
            | MergeError::MissingConfigError { field } => {
                format!("Fix the '{}' setting and rerun", field)
            }
            MergeError::ProcessingError { .. } => {
                "Rerun with --verbose to locate the source that failed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("A download failed: {}", self),
            ErrorCategory::Io => format!("A file operation failed: {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
