use thiserror::Error;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("{op}: {message}, position: {position}, peek: {peek}")]
    Syntax {
        op: &'static str,
        message: String,
        position: usize,
        peek: String,
    },

    #[error("{context}[{input}] at offset {offset}")]
    InvalidDateTime {
        context: String,
        input: String,
        offset: usize,
    },

    #[error("Mark/reset is not supported when reading from a stream")]
    MarkUnsupported,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
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

impl JsonError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            JsonError::Syntax { .. }
            | JsonError::InvalidDateTime { .. }
            | JsonError::MarkUnsupported
            | JsonError::SerializationError(_) => ErrorCategory::Parse,
            JsonError::IoError(_) | JsonError::CsvError(_) => ErrorCategory::Io,
            JsonError::ConfigError { .. }
            | JsonError::MissingConfigError { .. }
            | JsonError::InvalidConfigValueError { .. }
            | JsonError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            JsonError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::Parse | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            JsonError::Syntax { .. } => {
                "Check that the input is valid JSON; the peek shows the bytes before the failure"
            }
            JsonError::InvalidDateTime { .. } => {
                "Use ISO-8601 (2019-10-04T16:06:36Z) or RFC 1123 (Fri, 04 Oct 2019 16:06:36 GMT)"
            }
            JsonError::MarkUnsupported => {
                "Read the input into memory first if you need mark/reset"
            }
            JsonError::IoError(_) => "Check that the input file exists and the output path is writable",
            JsonError::CsvError(_) => "Check the output path and the selected columns",
            JsonError::SerializationError(_) => "Check the values selected for JSON output",
            JsonError::ConfigError { .. }
            | JsonError::MissingConfigError { .. }
            | JsonError::InvalidConfigValueError { .. }
            | JsonError::ConfigValidationError { .. } => {
                "Review the command line flags or the TOML job file"
            }
            JsonError::ProcessingError { .. } => "Check the root path and field mappings against the input",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Parse => format!("Could not parse the input: {}", self),
            ErrorCategory::Io => format!("Could not read or write a file: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Processing => format!("Extraction failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, JsonError>;
